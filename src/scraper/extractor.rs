use crate::config::SiteConfig;
use crate::model::{ExtractionError, RawRecord};
use crate::parser::{ListingParser, Parser};
use crate::scraper::fetcher::PageFetcher;
use crate::scraper::traits::{Browser, Extractor};
use tracing::error;

/// Browser-backed extractor: render, then parse the listing document.
pub struct BrowserExtractor<B: Browser> {
    fetcher: PageFetcher<B>,
}

impl<B: Browser> BrowserExtractor<B> {
    pub fn new(fetcher: PageFetcher<B>) -> Self {
        Self { fetcher }
    }

    async fn try_extract(&self, site: &SiteConfig) -> Result<Vec<RawRecord>, ExtractionError> {
        let page = self.fetcher.fetch(&site.url, &site.selectors).await?;
        ListingParser::new(&site.selectors)?
            .with_base_url(&page.url)
            .parse(&page.html)
    }
}

#[async_trait::async_trait]
impl<B: Browser> Extractor for BrowserExtractor<B> {
    async fn extract(&self, site: &SiteConfig) -> Vec<RawRecord> {
        match self.try_extract(site).await {
            Ok(records) => records,
            Err(e) => {
                error!("Error loading the page {}: {}", site.url, e);
                Vec::new()
            }
        }
    }
}
