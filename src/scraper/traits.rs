use crate::config::SiteConfig;
use crate::model::{ExtractionError, RawRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementId(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn strategy(&self) -> (&'static str, &str) {
        match self {
            Locator::Css(v) => ("css selector", v.as_str()),
            Locator::XPath(v) => ("xpath", v.as_str()),
        }
    }
}

/// Starts browser sessions.
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError>;
}

/// One live browser session. `quit` must be called on every exit path.
#[async_trait::async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), ExtractionError>;
    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementId>, ExtractionError>;
    async fn click(&mut self, element: &ElementId) -> Result<(), ExtractionError>;
    /// `None` returns to the top-level document.
    async fn enter_frame(&mut self, frame: Option<&ElementId>) -> Result<(), ExtractionError>;
    async fn source(&mut self) -> Result<String, ExtractionError>;
    /// Base URL of the current document, the one its relative links resolve
    /// against (differs from the page URL inside an iframe).
    async fn document_url(&mut self) -> Result<String, ExtractionError>;
    async fn quit(&mut self) -> Result<(), ExtractionError>;
}

/// Listing page -> records. Failures are logged and yield what was collected.
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, site: &SiteConfig) -> Vec<RawRecord>;
}
