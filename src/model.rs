// Core structs: RawRecord, MatchRecord, MatchMap and the per-stage errors
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// One listing entry as it was read from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    #[serde(default)]
    pub date: String,
    pub link: String,
}

/// A notice the classifier accepted. Equality covers every field, the raw
/// classifier payload included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub title: String,
    pub date: String,
    pub link: String,
    pub result: Value,
}

/// Site URL -> matches already reported for that site, in insertion order.
pub type MatchMap = BTreeMap<String, Vec<MatchRecord>>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("environment variable {0} must be set")]
    MissingEnv(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("webdriver request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webdriver error ({status}): {message}")]
    WebDriver { status: u16, message: String },
    #[error("unexpected webdriver response: {0}")]
    InvalidResponse(String),
    #[error("timed out after {0}s waiting for listing elements")]
    Timeout(u64),
    #[error("invalid selector '{0}'")]
    Selector(String),
    #[error("element count mismatch: {titles} titles, {links} links")]
    CountMismatch { titles: usize, links: usize },
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint responded {status}: {body}")]
    Status { status: u16, body: String },
    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed store file {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to encode json: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
