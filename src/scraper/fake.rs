// In-memory browser for tests: element lookups answered from a fixed table.
use crate::model::ExtractionError;
use crate::scraper::traits::{Browser, BrowserSession, ElementId, Locator};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Element ids per document; document "top" is the page, any other key is
/// the id of an iframe element.
#[derive(Default)]
pub struct FakePage {
    pub docs: HashMap<String, HashMap<String, Vec<String>>>,
    /// Page source per document; `<html>{doc}</html>` when absent.
    pub sources: HashMap<String, String>,
    pub fail_navigation: bool,
}

#[derive(Default)]
pub struct Log {
    pub clicks: Vec<String>,
    pub quits: usize,
    pub frame: Option<String>,
}

pub struct FakeBrowser {
    page: Arc<FakePage>,
    log: Arc<Mutex<Log>>,
}

pub fn fake_browser(page: FakePage) -> (FakeBrowser, Arc<Mutex<Log>>) {
    let log = Arc::new(Mutex::new(Log::default()));
    let browser = FakeBrowser {
        page: Arc::new(page),
        log: log.clone(),
    };
    (browser, log)
}

/// `ids` is a space separated list of element ids.
pub fn doc(entries: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(sel, ids)| (sel.to_string(), ids.split_whitespace().map(String::from).collect()))
        .collect()
}

struct FakeSession {
    page: Arc<FakePage>,
    log: Arc<Mutex<Log>>,
}

impl FakeSession {
    fn current_doc(&self) -> String {
        self.log.lock().unwrap().frame.clone().unwrap_or_else(|| "top".into())
    }
}

#[async_trait::async_trait]
impl Browser for FakeBrowser {
    async fn open(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        Ok(Box::new(FakeSession {
            page: self.page.clone(),
            log: self.log.clone(),
        }))
    }
}

#[async_trait::async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, _url: &str) -> Result<(), ExtractionError> {
        if self.page.fail_navigation {
            return Err(ExtractionError::WebDriver {
                status: 500,
                message: "unknown error: net::ERR_NAME_NOT_RESOLVED".into(),
            });
        }
        Ok(())
    }

    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<ElementId>, ExtractionError> {
        let (_, value) = locator.strategy();
        let doc = self.current_doc();
        Ok(self
            .page
            .docs
            .get(&doc)
            .and_then(|d| d.get(value))
            .map(|ids| ids.iter().cloned().map(ElementId).collect())
            .unwrap_or_default())
    }

    async fn click(&mut self, element: &ElementId) -> Result<(), ExtractionError> {
        self.log.lock().unwrap().clicks.push(element.0.clone());
        Ok(())
    }

    async fn enter_frame(&mut self, frame: Option<&ElementId>) -> Result<(), ExtractionError> {
        self.log.lock().unwrap().frame = frame.map(|f| f.0.clone());
        Ok(())
    }

    async fn source(&mut self) -> Result<String, ExtractionError> {
        let doc = self.current_doc();
        Ok(self
            .page
            .sources
            .get(&doc)
            .cloned()
            .unwrap_or_else(|| format!("<html>{doc}</html>")))
    }

    async fn document_url(&mut self) -> Result<String, ExtractionError> {
        Ok(format!("https://example.org/{}", self.current_doc()))
    }

    async fn quit(&mut self) -> Result<(), ExtractionError> {
        self.log.lock().unwrap().quits += 1;
        Ok(())
    }
}
