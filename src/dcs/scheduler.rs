//! Weekly re-download scheduling over download-control-state records
//!
//! Every identifier maps to one of 52 buckets via a stable hash; entries in
//! the bucket matching the current ISO week are due for mandatory re-download.
//! The bucket is derived from the identifier alone, so the schedule needs no
//! per-entry state and survives record rewrites unchanged.

use crate::dcs::store::DcsStore;
use crate::provider::Provider;
use crate::Result;
use chrono::{Datelike, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

/// Number of weekly buckets
pub const WEEK_BUCKETS: u32 = 52;

/// The weekly bucket of an identifier
///
/// First eight bytes of SHA-256 over the identifier, read big-endian,
/// reduced modulo 52. Stable across runs and uniformly distributed.
pub fn weekly_bucket(id: &str) -> u32 {
    let digest = Sha256::digest(id.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % u64::from(WEEK_BUCKETS)) as u32
}

/// The current bucket index, derived from the ISO week number
///
/// ISO weeks run 1..=53; week 53 shares a bucket with week 1.
pub fn current_week() -> u32 {
    (Utc::now().iso_week().week() - 1) % WEEK_BUCKETS
}

/// Schedule queries consumed by the selectors and the crawler
///
/// The seam exists so tests can verify invocation counts and pin the week.
pub trait WeeklySchedule: Send + Sync {
    /// Identifiers due for mandatory re-download this week
    fn entries_scheduled_for_current_week(&self, provider: &Provider)
        -> Result<HashSet<String>>;

    /// Identifiers not yet due this week
    ///
    /// Used to suppress freshly discovered identifiers so that pagination
    /// discovery does not defeat the weekly throttling.
    fn entries_not_scheduled_for_current_week(
        &self,
        provider: &Provider,
    ) -> Result<HashSet<String>>;

    /// The highest numeric identifier already in the dataset, 0 if none
    fn highest_id_already_in_dataset(&self, provider: &Provider) -> Result<u32>;
}

/// Schedule queries over a provider's download-control-state records
#[derive(Debug, Clone)]
pub struct DcsScheduler {
    store: Arc<DcsStore>,
    week_override: Option<u32>,
}

impl DcsScheduler {
    pub fn new(store: Arc<DcsStore>) -> Self {
        Self {
            store,
            week_override: None,
        }
    }

    /// A scheduler pinned to a fixed week instead of the current ISO week
    pub fn with_fixed_week(store: Arc<DcsStore>, week: u32) -> Self {
        Self {
            store,
            week_override: Some(week),
        }
    }

    fn week(&self) -> u32 {
        self.week_override.unwrap_or_else(current_week)
    }

    /// Identifiers whose bucket equals the given week
    pub fn entries_scheduled_for_week(
        &self,
        provider: &Provider,
        week: u32,
    ) -> Result<HashSet<String>> {
        let ids = self.store.all_ids(provider)?;
        Ok(ids
            .into_iter()
            .filter(|id| weekly_bucket(id) == week % WEEK_BUCKETS)
            .collect())
    }

    /// Identifiers whose bucket differs from the given week
    pub fn entries_not_scheduled_for_week(
        &self,
        provider: &Provider,
        week: u32,
    ) -> Result<HashSet<String>> {
        let ids = self.store.all_ids(provider)?;
        Ok(ids
            .into_iter()
            .filter(|id| weekly_bucket(id) != week % WEEK_BUCKETS)
            .collect())
    }

    /// The highest numeric identifier already in the dataset, 0 if none
    ///
    /// Serves as a lower safety bound for freshly detected highest IDs: a
    /// live site reporting less than this value lost entries.
    pub fn highest_id_already_in_dataset(&self, provider: &Provider) -> Result<u32> {
        self.store.highest_id(provider)
    }
}

impl WeeklySchedule for DcsScheduler {
    fn entries_scheduled_for_current_week(
        &self,
        provider: &Provider,
    ) -> Result<HashSet<String>> {
        self.entries_scheduled_for_week(provider, self.week())
    }

    fn entries_not_scheduled_for_current_week(
        &self,
        provider: &Provider,
    ) -> Result<HashSet<String>> {
        self.entries_not_scheduled_for_week(provider, self.week())
    }

    fn highest_id_already_in_dataset(&self, provider: &Provider) -> Result<u32> {
        DcsScheduler::highest_id_already_in_dataset(self, provider)
    }
}
