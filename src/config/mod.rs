//! Configuration loading, validation and resolution
//!
//! The TOML file describes the storage directories, the HTTP client and one
//! `[[provider]]` table per source. After validation the entries resolve into
//! immutable [`Provider`](crate::provider::Provider) values and a
//! [`StoragePaths`] describing where all durable state lives.

pub mod parser;
pub mod types;
pub mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, HttpConfig, ProviderEntry, StorageConfig};

use crate::provider::{Provider, ProviderKind};
use crate::ConfigError;
use std::path::{Path, PathBuf};

/// How a provider's working set is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Dense numeric identifiers, `1..=highest` minus exclusions
    IdRange,
    /// Numeric listing pages
    Pages,
    /// Year/season token listing pages
    Seasons,
}

impl ProviderEntry {
    /// Resolves the crawl mode string
    pub fn crawl_mode(&self) -> Result<CrawlMode, ConfigError> {
        match self.crawl.as_str() {
            "id-range" => Ok(CrawlMode::IdRange),
            "pages" => Ok(CrawlMode::Pages),
            "seasons" => Ok(CrawlMode::Seasons),
            other => Err(ConfigError::Validation(format!(
                "unknown crawl mode '{}'",
                other
            ))),
        }
    }

    /// Resolves this entry into an immutable provider description
    pub fn to_provider(&self) -> Result<Provider, ConfigError> {
        let kind = match self.kind.as_str() {
            "dcs-tracked" => ProviderKind::DcsTracked,
            "listing-only" => ProviderKind::ListingOnly,
            other => {
                return Err(ConfigError::Validation(format!(
                    "unknown provider kind '{}'",
                    other
                )));
            }
        };

        Ok(Provider {
            hostname: self.hostname.clone(),
            kind,
            raw_file_suffix: self.raw_file_suffix.clone(),
            anime_link_template: self.anime_link.clone(),
            data_download_link_template: self.data_download_link.clone(),
            listing_link_template: self.listing_link.clone(),
            no_entries_marker: self.no_entries_marker.clone(),
        })
    }
}

/// Resolved locations of all durable state
#[derive(Debug, Clone)]
pub struct StoragePaths {
    /// Parent of the per-provider working directories
    pub download_dir: PathBuf,

    /// Download-control-state directory, also holds merge.lock
    pub dcs_dir: PathBuf,

    /// Output directory, holds the dead-entries files
    pub output_dir: PathBuf,
}

impl StoragePaths {
    pub fn from_config(storage: &StorageConfig) -> Self {
        Self {
            download_dir: PathBuf::from(&storage.download_dir),
            dcs_dir: PathBuf::from(&storage.download_control_state_dir),
            output_dir: PathBuf::from(&storage.output_dir),
        }
    }

    /// Working directory of a provider: raw artifacts and the last-page file
    pub fn working_dir(&self, provider: &Provider) -> PathBuf {
        self.download_dir.join(provider.short_name())
    }

    /// Directory holding the dead-entries files of all providers
    pub fn dead_entries_dir(&self) -> PathBuf {
        self.output_dir.join("dead-entries")
    }

    /// The merge.lock file
    pub fn merge_lock_file(&self) -> PathBuf {
        self.dcs_dir.join("merge.lock")
    }
}

impl StoragePaths {
    /// Paths rooted at an arbitrary base directory, used by tests
    pub fn rooted_at(base: &Path) -> Self {
        Self {
            download_dir: base.join("downloads"),
            dcs_dir: base.join("dcs"),
            output_dir: base.join("output"),
        }
    }
}
