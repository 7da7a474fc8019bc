//! Crawl cycle for providers enumerated through paginated listings

use crate::crawler::session::{CrawlSession, DownloadTally};
use crate::crawler::traits::HighestIdDetector;
use crate::cursor::{CursorStrategy, LastPageStore};
use crate::selector::PaginationSelector;
use crate::Result;
use std::sync::Arc;

/// One provider's crawl cycle over listing-page cursors
///
/// The cursor sequence is computed once up front from the memorized cursor
/// and the freshly detected upper bound. A cursor is memorized only after
/// every download it yielded has completed, so an interrupted run resumes at
/// the first cursor whose work is not known to be done.
pub struct PaginationCrawler {
    session: CrawlSession,
    selector: PaginationSelector,
    memorizer: Arc<dyn LastPageStore>,
    strategy: Box<dyn CursorStrategy>,
    detector: Box<dyn HighestIdDetector>,
}

impl PaginationCrawler {
    pub fn new(
        session: CrawlSession,
        selector: PaginationSelector,
        memorizer: Arc<dyn LastPageStore>,
        strategy: Box<dyn CursorStrategy>,
        detector: Box<dyn HighestIdDetector>,
    ) -> Self {
        Self {
            session,
            selector,
            memorizer,
            strategy,
            detector,
        }
    }

    pub async fn run(&self) -> Result<DownloadTally> {
        let hostname = self.session.provider().hostname.clone();

        let due = self.session.due_for_redownload()?;
        let memorized = self.memorizer.retrieve()?;
        let newest = self.detector.detect_highest_id().await?;
        let cursors = self.strategy.remaining_cursors(&memorized, newest)?;

        if due.is_empty() && cursors.is_empty() {
            tracing::info!("Nothing to download for {}", hostname);
            return Ok(DownloadTally::default());
        }

        tracing::info!(
            "Crawling {}: {} due for re-download, {} pages remaining",
            hostname,
            due.len(),
            cursors.len()
        );

        let mut tally = DownloadTally::default();
        self.session.download_all(&due, &mut tally).await?;

        for cursor in &cursors {
            let ids = self.selector.id_download_list(cursor).await?;
            self.session.download_all(&ids, &mut tally).await?;
            self.memorizer.memorize(cursor)?;
        }

        tracing::info!(
            "Finished {}: {} saved, {} dead, {} blank",
            hostname,
            tally.saved,
            tally.dead,
            tally.empty
        );
        Ok(tally)
    }
}
