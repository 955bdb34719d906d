use crate::classifier::Classifier;
use crate::config::SiteConfig;
use crate::model::{MatchMap, MatchRecord, StorageError};
use crate::notifier::Notifier;
use crate::scraper::Extractor;
use crate::storage::{MatchStore, save_snapshot};
use std::path::PathBuf;
use tracing::{info, warn};

/// Counters for one pass over all sites.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub sites: usize,
    pub extracted: usize,
    pub matched: usize,
    pub new_matches: usize,
    pub notified: bool,
}

/// One run: load state, extract/classify/diff every site, notify, persist.
pub struct Pipeline<'a> {
    pub extractor: &'a dyn Extractor,
    pub classifier: &'a dyn Classifier,
    pub notifier: &'a dyn Notifier,
    pub store: &'a dyn MatchStore,
    pub snapshot_path: Option<PathBuf>,
}

impl Pipeline<'_> {
    /// Only a store that cannot be read or written ends the run with an
    /// error; every other failure just means fewer matches.
    pub async fn run(&self, sites: &[SiteConfig]) -> Result<RunReport, StorageError> {
        let mut previous = self.store.load()?;
        info!(
            "Previous matches: {} sites, {} records",
            previous.len(),
            previous.values().map(Vec::len).sum::<usize>()
        );

        let mut report = RunReport::default();
        let mut new_matches = Vec::new();

        for site in sites {
            info!("Processing site: {}", site.url);
            report.sites += 1;

            let records = self.extractor.extract(site).await;
            info!("Extracted {} records", records.len());
            report.extracted += records.len();

            if let Some(path) = &self.snapshot_path {
                if let Err(e) = save_snapshot(path, &records) {
                    warn!("Snapshot write failed: {}", e);
                }
            }

            let matches = self.classifier.classify(&records, &site.keywords).await;
            report.matched += matches.len();

            let fresh = record_new(&mut previous, &site.url, matches);
            info!("Found {} new matches for {}", fresh.len(), site.url);
            new_matches.extend(fresh);
        }

        report.new_matches = new_matches.len();
        if new_matches.is_empty() {
            info!("No new matches, no email sent.");
        } else {
            match self.notifier.notify(&new_matches).await {
                Ok(()) => report.notified = true,
                Err(e) => warn!("Failed to send email: {}", e),
            }
        }

        self.store.save(&previous)?;
        info!("Saved matches to store.");
        Ok(report)
    }
}

/// Appends every match not yet stored under `url` and returns those. The
/// key is created even when nothing matched.
pub fn record_new(
    store: &mut MatchMap,
    url: &str,
    matches: Vec<MatchRecord>,
) -> Vec<MatchRecord> {
    let seen = store.entry(url.to_string()).or_default();
    let mut fresh = Vec::new();
    for m in matches {
        if !seen.contains(&m) {
            seen.push(m.clone());
            fresh.push(m);
        }
    }
    fresh
}
