// Listing-page parsing: rendered HTML -> RawRecord
use crate::config::SelectorConfig;
use crate::model::{ExtractionError, RawRecord};
use ::scraper::{ElementRef, Html, Selector};
use reqwest::Url;
use tracing::{info, warn};

pub trait Parser {
    fn parse(&self, html: &str) -> Result<Vec<RawRecord>, ExtractionError>;
}

pub struct ListingParser {
    row: Option<Selector>,
    title: Selector,
    link: Selector,
    date: Option<Selector>,
    trim_prefix: usize,
    trim_suffix: usize,
    base: Option<Url>,
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|_| ExtractionError::Selector(css.to_string()))
}

impl ListingParser {
    pub fn new(cfg: &SelectorConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            row: cfg.row.as_deref().map(selector).transpose()?,
            title: selector(&cfg.title)?,
            link: selector(&cfg.link)?,
            date: cfg.date.as_deref().map(selector).transpose()?,
            trim_prefix: cfg.link_trim_prefix,
            trim_suffix: cfg.link_trim_suffix,
            base: None,
        })
    }

    /// Relative hrefs are resolved against `base` before trimming, so the
    /// trim always cuts the absolute URL a browser would report.
    pub fn with_base_url(mut self, base: &str) -> Self {
        match Url::parse(base) {
            Ok(url) => self.base = Some(url),
            Err(e) => warn!("Cannot resolve links against {}: {}", base, e),
        }
        self
    }

    fn link_of(&self, el: ElementRef) -> Option<String> {
        let href = el.value().attr("href")?;
        let absolute = match &self.base {
            Some(base) => base.join(href).map(String::from).unwrap_or_else(|_| href.to_string()),
            None => href.to_string(),
        };
        Some(trim_link(&absolute, self.trim_prefix, self.trim_suffix))
    }

    /// One record per row; fields are looked up inside the row they belong to.
    fn parse_rows(&self, document: &Html, row: &Selector) -> Vec<RawRecord> {
        let mut records = Vec::new();

        for (i, row_el) in document.select(row).enumerate() {
            let Some(title_el) = row_el.select(&self.title).next() else {
                warn!("Row {}: no title element, skipping", i);
                continue;
            };
            let Some(link) = row_el.select(&self.link).next().and_then(|el| self.link_of(el)) else {
                warn!("Row {}: no link, skipping", i);
                continue;
            };
            let date = self
                .date
                .as_ref()
                .and_then(|sel| row_el.select(sel).next())
                .map(element_text)
                .unwrap_or_default();

            let record = RawRecord {
                title: element_text(title_el),
                date,
                link,
            };
            info!("Extracted: {}, {}, {}", record.title, record.date, record.link);
            records.push(record);
        }

        records
    }

    /// Index-aligned collections. Differing counts mean the page layout no
    /// longer matches the selectors, so nothing is returned.
    fn parse_positional(&self, document: &Html) -> Result<Vec<RawRecord>, ExtractionError> {
        let titles: Vec<ElementRef> = document.select(&self.title).collect();
        let links: Vec<ElementRef> = document.select(&self.link).collect();
        let dates: Vec<ElementRef> = self
            .date
            .as_ref()
            .map(|sel| document.select(sel).collect())
            .unwrap_or_default();

        info!("Found {} titles, {} dates, and {} links.", titles.len(), dates.len(), links.len());

        if titles.len() != links.len() {
            return Err(ExtractionError::CountMismatch {
                titles: titles.len(),
                links: links.len(),
            });
        }
        let use_dates = self.date.is_some() && dates.len() == titles.len();
        if self.date.is_some() && !use_dates {
            warn!(
                "Date count {} differs from title count {}, leaving dates empty",
                dates.len(),
                titles.len()
            );
        }

        let mut records = Vec::with_capacity(titles.len());
        for (i, (title_el, link_el)) in titles.into_iter().zip(links).enumerate() {
            let Some(link) = self.link_of(link_el) else {
                warn!("Error extracting data: element {} has no href", i);
                continue;
            };
            let date = if use_dates { element_text(dates[i]) } else { String::new() };

            let record = RawRecord {
                title: element_text(title_el),
                date,
                link,
            };
            info!("Extracted: {}, {}, {}", record.title, record.date, record.link);
            records.push(record);
        }

        Ok(records)
    }
}

impl Parser for ListingParser {
    fn parse(&self, html: &str) -> Result<Vec<RawRecord>, ExtractionError> {
        let document = Html::parse_document(html);
        match &self.row {
            Some(row) => Ok(self.parse_rows(&document, row)),
            None => self.parse_positional(&document),
        }
    }
}

/// Visible text with whitespace runs collapsed, the way a browser reports it.
fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops `prefix` leading and `suffix` trailing characters. Anything not
/// longer than both together becomes empty.
pub fn trim_link(href: &str, prefix: usize, suffix: usize) -> String {
    let len = href.chars().count();
    if len <= prefix + suffix {
        return String::new();
    }
    href.chars().skip(prefix).take(len - prefix - suffix).collect()
}
