pub mod extractor;
pub mod fetcher;
pub mod traits;
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake;

pub use extractor::BrowserExtractor;
pub use fetcher::PageFetcher;
pub use traits::Extractor;
pub use webdriver::WebDriverBrowser;
