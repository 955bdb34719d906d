use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const BRANDENBURG_URL: &str = "https://vergabemarktplatz.brandenburg.de/VMPCenter/common/project/search.do?method=showExtendedSearch&fromExternal=true#eyJjcHZDb2RlcyI6W10sImNvbnRyYWN0aW5nUnVsZXMiOlsiVk9MIiwiVk9CIiwiVlNWR1YiLCJTRUtUVk8iLCJPVEhFUiJdLCJwdWJsaWNhdGlvblR5cGVzIjpbIkV4QW50ZSIsIlRlbmRlciIsIkV4UG9zdCJdLCJkaXN0YW5jZSI6MCwicG9zdGFsQ29kZSI6IiIsIm9yZGVyIjoiMCIsInBhZ2UiOiIxIiwic2VhcmNoVGV4dCI6InZlcnBmbGVndW5nIiwic29ydEZpZWxkIjoicmFuayJ9";

/// Where and how to find the listing inside a rendered page.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// XPath of the cookie banner's "accept all" button.
    pub consent_xpath: String,
    /// CSS selector that marks the document (or iframe) holding the listing.
    pub container: String,
    /// Optional CSS selector for one listing row. When set, title, link and
    /// date are looked up inside each row instead of aligned by index.
    pub row: Option<String>,
    pub title: String,
    pub link: String,
    pub date: Option<String>,
    /// Characters cut from the front of every href.
    pub link_trim_prefix: usize,
    /// Characters cut from the back of every href.
    pub link_trim_suffix: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            consent_xpath: "//button[contains(text(), 'alle akzeptieren')]".into(),
            container: ".title".into(),
            row: None,
            title: ".word-break".into(),
            link: ".noTextDecorationLink".into(),
            date: None,
            link_trim_prefix: 29,
            link_trim_suffix: 21,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub url: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub chrome_args: Vec<String>,
    pub settle_delay_secs: u64,
    pub element_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            chrome_args: [
                "--headless",
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--window-size=1920,1080",
            ]
            .iter()
            .map(|a| a.to_string())
            .collect(),
            settle_delay_secs: 5,
            element_timeout_secs: 30,
            poll_interval_ms: 500,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub api_url: String,
    /// A record is relevant when any label scores strictly above this.
    pub threshold: f64,
    pub max_length: usize,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api-inference.huggingface.co/models/facebook/bart-large-mnli".into(),
            threshold: 0.01,
            max_length: 512,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Falls back to the sending account when unset.
    pub recipient: Option<String>,
    pub subject: String,
    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 465,
            recipient: None,
            subject: "Neue Ausschreibungen verfügbar!!".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sites: Vec<SiteConfig>,
    pub browser: BrowserConfig,
    pub classifier: ClassifierConfig,
    pub email: EmailConfig,
    pub store_path: PathBuf,
    pub snapshot_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sites: vec![SiteConfig {
                url: BRANDENBURG_URL.into(),
                keywords: vec!["catering".into(), "mittag".into()],
                selectors: SelectorConfig::default(),
            }],
            browser: BrowserConfig::default(),
            classifier: ClassifierConfig::default(),
            email: EmailConfig::default(),
            store_path: PathBuf::from("matches.json"),
            snapshot_path: PathBuf::from("extracted_text_parts.json"),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::Invalid("no sites configured".into()));
        }
        for site in &self.sites {
            if site.url.trim().is_empty() {
                return Err(ConfigError::Invalid("site with empty url".into()));
            }
            if site.keywords.is_empty() {
                return Err(ConfigError::Invalid(format!("site {} has no keywords", site.url)));
            }
            let sel = &site.selectors;
            let css = [
                Some(&sel.container),
                sel.row.as_ref(),
                Some(&sel.title),
                Some(&sel.link),
                sel.date.as_ref(),
            ];
            for selector in css.into_iter().flatten() {
                if ::scraper::Selector::parse(selector).is_err() {
                    return Err(ConfigError::Invalid(format!(
                        "invalid css selector '{}'",
                        selector
                    )));
                }
            }
        }
        if !(0.0..=1.0).contains(&self.classifier.threshold) {
            return Err(ConfigError::Invalid(format!(
                "classifier.threshold must be within 0..=1, got {}",
                self.classifier.threshold
            )));
        }
        if self.classifier.max_length == 0 {
            return Err(ConfigError::Invalid("classifier.max_length must be positive".into()));
        }
        Ok(())
    }
}

/// Reads the settings file. A missing file at the default location means
/// "use the built-in settings"; a missing file that was asked for explicitly
/// is an error.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG_PATH), false),
    };

    if !explicit && !path.exists() {
        tracing::info!("No {} found, using built-in settings", path.display());
        let config = AppConfig::default();
        config.validate()?;
        return Ok(config);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config = parse_config(&content).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
        path: "<inline>".into(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Secrets that only ever come from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_token: String,
    pub email_address: String,
    pub email_password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email_address", &self.email_address)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        // .env is optional
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(key))
        };

        Ok(Self {
            api_token: require("HUGGINGFACE_API_TOKEN")?,
            email_address: require("EMAIL_ADDRESS")?,
            email_password: require("EMAIL_PASSWORD")?,
        })
    }
}
