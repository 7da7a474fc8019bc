//! Already-downloaded lookup
//!
//! Scans a provider's working directory for persisted raw artifacts so the
//! selectors can exclude identifiers that were already fetched.

use crate::config::StoragePaths;
use crate::dcs::store::collect_ids;
use crate::provider::Provider;
use crate::Result;
use std::collections::HashSet;

/// Filesystem scan over a provider's raw artifacts
#[derive(Debug, Clone)]
pub struct AlreadyDownloadedFinder {
    paths: StoragePaths,
}

impl AlreadyDownloadedFinder {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// Identifiers with an existing raw artifact in the working directory
    ///
    /// A provider without a working directory has downloaded nothing yet.
    pub fn already_downloaded(&self, provider: &Provider) -> Result<HashSet<String>> {
        collect_ids(
            &self.paths.working_dir(provider),
            &provider.raw_file_suffix,
        )
    }
}
