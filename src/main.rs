mod classifier;
mod config;
mod model;
mod notifier;
mod parser;
mod pipeline;
mod scraper;
mod storage;

use crate::classifier::{HuggingFaceClient, RelevanceClassifier};
use crate::config::{load_config, AppConfig, Credentials};
use crate::notifier::EmailNotifier;
use crate::pipeline::Pipeline;
use crate::scraper::{BrowserExtractor, PageFetcher, WebDriverBrowser};
use crate::storage::{JsonFileStore, MatchStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_CONFIG: u8 = 1;
const EXIT_FATAL: u8 = 2;

/// Watches procurement listings and mails new relevant notices.
#[derive(Debug, Parser)]
#[command(name = "tender-watch", version)]
struct Cli {
    /// Settings file (defaults to ./config.json, built-in settings if absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the match store path from the settings file
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Check every site once (default)
    Run,
    /// Reset the match store to an empty ledger
    Clear,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    std::panic::set_hook(Box::new(|panic_info| {
        error!("😱 Panic occurred: {}", panic_info);
    }));

    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    let store = JsonFileStore::new(&config.store_path);
    info!("Match store: {}", store.path().display());

    match cli.command.unwrap_or(Command::Run) {
        Command::Clear => match store.clear() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Failed to clear store: {}", e);
                ExitCode::from(EXIT_FATAL)
            }
        },
        Command::Run => run(&config, &store).await,
    }
}

/// Wires the components. Every credential and address is checked here,
/// before the first network call.
async fn run(config: &AppConfig, store: &JsonFileStore) -> ExitCode {
    let creds = match Credentials::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let notifier = match EmailNotifier::new(&config.email, &creds) {
        Ok(n) => n,
        Err(e) => {
            error!("Configuration error (email): {}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let zero_shot = match HuggingFaceClient::new(
        &config.classifier.api_url,
        &creds.api_token,
        Duration::from_secs(config.classifier.timeout_secs),
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create classifier client: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let classifier = RelevanceClassifier::new(zero_shot, &config.classifier);

    let browser = match WebDriverBrowser::new(
        &config.browser.webdriver_url,
        config.browser.chrome_args.clone(),
        Duration::from_secs(config.browser.request_timeout_secs),
    ) {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to create webdriver client: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let extractor = BrowserExtractor::new(PageFetcher::new(browser, &config.browser));

    let pipeline = Pipeline {
        extractor: &extractor,
        classifier: &classifier,
        notifier: &notifier,
        store,
        snapshot_path: Some(config.snapshot_path.clone()),
    };

    info!("🚀 Checking {} sites...", config.sites.len());
    match pipeline.run(&config.sites).await {
        Ok(report) => {
            info!(
                sites = report.sites,
                extracted = report.extracted,
                matched = report.matched,
                new_matches = report.new_matches,
                notified = report.notified,
                "✅ Run finished"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Match store error: {}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
