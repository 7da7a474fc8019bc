//! Working-set selection from provider listing pages

use crate::crawler::finder::AlreadyDownloadedFinder;
use crate::crawler::traits::{EntryExtractor, PageFetcher};
use crate::dcs::scheduler::WeeklySchedule;
use crate::dead_entries::DeadEntriesRegistry;
use crate::provider::{Provider, ProviderKind};
use crate::{AnisinkError, Result};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;

/// Selector extracting candidate identifiers from one listing page
///
/// An HTTP 404 or the provider's no-entries marker is the normal terminal
/// signal of pagination and yields an empty list; a body in which no entries
/// can be located at all is fatal.
pub struct PaginationSelector {
    provider: Arc<Provider>,
    fetcher: Box<dyn PageFetcher>,
    extractor: Box<dyn EntryExtractor>,
    schedule: Arc<dyn WeeklySchedule>,
    dead_entries: Arc<DeadEntriesRegistry>,
    finder: AlreadyDownloadedFinder,
    // The not-scheduled lookup is queried once per run, not once per page.
    not_scheduled: OnceCell<HashSet<String>>,
}

impl PaginationSelector {
    pub fn new(
        provider: Arc<Provider>,
        fetcher: Box<dyn PageFetcher>,
        extractor: Box<dyn EntryExtractor>,
        schedule: Arc<dyn WeeklySchedule>,
        dead_entries: Arc<DeadEntriesRegistry>,
        finder: AlreadyDownloadedFinder,
    ) -> Self {
        Self {
            provider,
            fetcher,
            extractor,
            schedule,
            dead_entries,
            finder,
            not_scheduled: OnceCell::new(),
        }
    }

    /// Candidate identifiers of one listing page, filtered
    ///
    /// Survivors exclude known-dead identifiers, identifiers not yet due this
    /// week and identifiers with an existing raw artifact. Order is
    /// unconstrained. Listing-only providers have no per-identifier dead
    /// markers; for them the crawler handles liveness.
    pub async fn id_download_list(&self, page: &str) -> Result<Vec<String>> {
        let url = self.provider.listing_link(page)?;
        let response = self.fetcher.fetch(&url).await?;

        if response.status == 404 {
            tracing::debug!("Page {} of {} does not exist", page, self.provider.hostname);
            return Ok(Vec::new());
        }

        if let Some(marker) = &self.provider.no_entries_marker {
            if response.body.contains(marker.as_str()) {
                tracing::debug!("Page {} of {} has no entries", page, self.provider.hostname);
                return Ok(Vec::new());
            }
        }

        let ids = self.extractor.extract(&response.body).ok_or_else(|| {
            AnisinkError::PageExtraction {
                hostname: self.provider.hostname.clone(),
                page: page.to_string(),
            }
        })?;

        let dead = match self.provider.kind {
            ProviderKind::DcsTracked => self.dead_entries.fetch_dead_entries(&self.provider)?,
            ProviderKind::ListingOnly => HashSet::new(),
        };
        let not_due = self.not_scheduled.get_or_try_init(|| {
            self.schedule
                .entries_not_scheduled_for_current_week(&self.provider)
        })?;
        let downloaded = self.finder.already_downloaded(&self.provider)?;

        Ok(ids
            .into_iter()
            .filter(|id| !dead.contains(id))
            .filter(|id| !not_due.contains(id))
            .filter(|id| !downloaded.contains(id))
            .collect())
    }
}
