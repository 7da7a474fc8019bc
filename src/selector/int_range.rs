//! Working-set selection over a dense integer identifier range

use crate::crawler::finder::AlreadyDownloadedFinder;
use crate::crawler::traits::HighestIdDetector;
use crate::dcs::scheduler::WeeklySchedule;
use crate::dead_entries::DeadEntriesRegistry;
use crate::provider::Provider;
use crate::{AnisinkError, Result};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Selector for providers with dense numeric identifiers
pub struct IntRangeSelector {
    provider: Arc<Provider>,
    detector: Box<dyn HighestIdDetector>,
    schedule: Arc<dyn WeeklySchedule>,
    dead_entries: Arc<DeadEntriesRegistry>,
    finder: AlreadyDownloadedFinder,
}

impl IntRangeSelector {
    pub fn new(
        provider: Arc<Provider>,
        detector: Box<dyn HighestIdDetector>,
        schedule: Arc<dyn WeeklySchedule>,
        dead_entries: Arc<DeadEntriesRegistry>,
        finder: AlreadyDownloadedFinder,
    ) -> Self {
        Self {
            provider,
            detector,
            schedule,
            dead_entries,
            finder,
        }
    }

    /// The working set for this crawl cycle, in randomized order
    ///
    /// Enumerates `1..=highest` and subtracts dead identifiers, identifiers
    /// not yet due this week and identifiers with an existing raw artifact.
    /// Shuffling spreads the load on the target server instead of hammering
    /// it in ascending sequence; no ordering is part of the contract.
    pub async fn id_download_list(&self) -> Result<Vec<String>> {
        let highest = self.detector.detect_highest_id().await?;
        if highest == 0 {
            return Err(AnisinkError::HighestIdNotPositive {
                hostname: self.provider.hostname.clone(),
                value: i64::from(highest),
            });
        }

        let recorded = self.schedule.highest_id_already_in_dataset(&self.provider)?;
        if highest < recorded {
            return Err(AnisinkError::HighestIdRegression {
                hostname: self.provider.hostname.clone(),
                detected: highest,
                recorded,
            });
        }

        let dead = self.dead_entries.fetch_dead_entries(&self.provider)?;
        let not_due = self
            .schedule
            .entries_not_scheduled_for_current_week(&self.provider)?;
        let downloaded = self.finder.already_downloaded(&self.provider)?;

        let mut ids: Vec<String> = (1..=highest)
            .map(|id| id.to_string())
            .filter(|id| !dead.contains(id))
            .filter(|id| !not_due.contains(id))
            .filter(|id| !downloaded.contains(id))
            .collect();

        ids.shuffle(&mut rand::thread_rng());

        tracing::debug!(
            "Selected {} of {} identifiers for {}",
            ids.len(),
            highest,
            self.provider.hostname
        );
        Ok(ids)
    }
}
