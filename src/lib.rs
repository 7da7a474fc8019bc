//! Anisink: crawl orchestration for a cross-provider anime metadata dataset
//!
//! This crate implements the crawl orchestration and cross-provider identity
//! state of an anime metadata aggregator: resumable per-provider crawling,
//! weekly re-download scheduling, dead-entry bookkeeping and the merge-lock
//! registry that pins cross-provider identity decisions.

pub mod anime;
pub mod config;
pub mod crawler;
pub mod cursor;
pub mod dcs;
pub mod dead_entries;
pub mod merge_lock;
pub mod provider;
pub mod selector;

use thiserror::Error;

/// Main error type for Anisink operations
#[derive(Debug, Error)]
pub enum AnisinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("No configured provider recognizes [{uri}]")]
    UnknownProvider { uri: String },

    #[error("Dead entries are not supported for [{hostname}]")]
    UnsupportedProvider { hostname: String },

    #[error("Highest ID must be greater than 0, but was [{value}] for [{hostname}]")]
    HighestIdNotPositive { hostname: String, value: i64 },

    #[error(
        "Detected highest ID [{detected}] for [{hostname}] is smaller than the highest ID already in the dataset [{recorded}]"
    )]
    HighestIdRegression {
        hostname: String,
        detected: u32,
        recorded: u32,
    },

    #[error("Unable to parse persisted page cursor [{content}] for [{hostname}]")]
    CursorParse { hostname: String, content: String },

    #[error("Unable to locate entries on page [{page}] of [{hostname}]")]
    PageExtraction { hostname: String, page: String },

    #[error("Unable to extract identifier from [{uri}] for [{hostname}]")]
    IdentifierExtraction { hostname: String, uri: String },

    #[error("merge.lock contains URIs belonging to more than one entry: {uris:?}")]
    MergeLockDuplicates { uris: Vec<String> },

    #[error("About to add a duplicate merge.lock entry for [{uri}]")]
    MergeLockConflict { uri: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias for Anisink operations
pub type Result<T> = std::result::Result<T, AnisinkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use anime::{Anime, AnimeStatus, AnimeType};
pub use config::Config;
pub use provider::{Provider, ProviderKind};
