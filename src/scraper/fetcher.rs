use crate::config::{BrowserConfig, SelectorConfig};
use crate::model::ExtractionError;
use crate::scraper::traits::{Browser, BrowserSession, ElementId, Locator};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

/// The document (top-level or iframe) that holds the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Base URL for resolving the document's relative links.
    pub url: String,
    pub html: String,
}

/// Drives one browser session to a listing page and returns the listing
/// document.
pub struct PageFetcher<B: Browser> {
    browser: B,
    settle_delay: Duration,
    element_timeout: Duration,
    poll_interval: Duration,
}

impl<B: Browser> PageFetcher<B> {
    pub fn new(browser: B, cfg: &BrowserConfig) -> Self {
        Self {
            browser,
            settle_delay: Duration::from_secs(cfg.settle_delay_secs),
            element_timeout: Duration::from_secs(cfg.element_timeout_secs),
            poll_interval: Duration::from_millis(cfg.poll_interval_ms),
        }
    }

    pub async fn fetch(
        &self,
        url: &str,
        selectors: &SelectorConfig,
    ) -> Result<RenderedPage, ExtractionError> {
        let mut session = self.browser.open().await?;
        let result = self.drive(session.as_mut(), url, selectors).await;
        if let Err(e) = session.quit().await {
            warn!("Failed to close browser session: {}", e);
        }
        result
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        selectors: &SelectorConfig,
    ) -> Result<RenderedPage, ExtractionError> {
        info!("Loading {}", url);
        session.navigate(url).await?;
        sleep(self.settle_delay).await;

        self.dismiss_consent(session, &selectors.consent_xpath).await;
        self.enter_listing_frame(session, &selectors.container).await?;

        let mut required = vec![
            Locator::Css(selectors.title.clone()),
            Locator::Css(selectors.link.clone()),
        ];
        if let Some(row) = &selectors.row {
            required.push(Locator::Css(row.clone()));
        }
        if let Some(date) = &selectors.date {
            required.push(Locator::Css(date.clone()));
        }
        for locator in &required {
            if self.wait_for(session, locator).await?.is_empty() {
                return Err(ExtractionError::Timeout(self.element_timeout.as_secs()));
            }
        }

        let html = session.source().await?;
        let base = match session.document_url().await {
            Ok(base) => base,
            Err(e) => {
                warn!("Could not read document URL, resolving links against {}: {}", url, e);
                url.to_string()
            }
        };
        Ok(RenderedPage { url: base, html })
    }

    /// Polls until `locator` matches something or the element timeout runs
    /// out. Always tries at least once.
    async fn wait_for(
        &self,
        session: &mut dyn BrowserSession,
        locator: &Locator,
    ) -> Result<Vec<ElementId>, ExtractionError> {
        let deadline = Instant::now() + self.element_timeout;
        loop {
            let found = session.find_all(locator).await?;
            if !found.is_empty() || Instant::now() >= deadline {
                return Ok(found);
            }
            sleep(self.poll_interval).await;
        }
    }

    async fn dismiss_consent(&self, session: &mut dyn BrowserSession, xpath: &str) {
        let locator = Locator::XPath(xpath.to_string());
        let button = match self.wait_for(session, &locator).await {
            Ok(found) => found.into_iter().next(),
            Err(e) => {
                warn!("Cookie popup lookup failed: {}", e);
                None
            }
        };

        match button {
            Some(el) => match session.click(&el).await {
                Ok(()) => info!("Cookies popup dismissed."),
                Err(e) => warn!("Cookies popup found but click failed: {}", e),
            },
            None => info!("No cookies popup found."),
        }
    }

    /// Stays in the top document when it has the listing container, otherwise
    /// switches into the first iframe that does.
    async fn enter_listing_frame(
        &self,
        session: &mut dyn BrowserSession,
        container: &str,
    ) -> Result<(), ExtractionError> {
        let container = Locator::Css(container.to_string());
        if !session.find_all(&container).await?.is_empty() {
            return Ok(());
        }

        let frames = session.find_all(&Locator::Css("iframe".into())).await?;
        info!("Found {} iframes on the page.", frames.len());
        for frame in &frames {
            session.enter_frame(Some(frame)).await?;
            if !session.find_all(&container).await?.is_empty() {
                info!("Found listing inside an iframe.");
                return Ok(());
            }
            session.enter_frame(None).await?;
        }
        Ok(())
    }
}
