//! Crawl cycle for providers enumerated by a dense integer ID range

use crate::crawler::session::{CrawlSession, DownloadTally};
use crate::selector::IntRangeSelector;
use crate::Result;

/// One provider's crawl cycle over `1..=highest`
///
/// The due set and the selector's working set are computed before anything is
/// written; when both are empty the cycle exits cleanly without touching the
/// filesystem.
pub struct RangeCrawler {
    session: CrawlSession,
    selector: IntRangeSelector,
}

impl RangeCrawler {
    pub fn new(session: CrawlSession, selector: IntRangeSelector) -> Self {
        Self { session, selector }
    }

    pub async fn run(&self) -> Result<DownloadTally> {
        let hostname = self.session.provider().hostname.clone();

        let due = self.session.due_for_redownload()?;
        let working_set = self.selector.id_download_list().await?;

        if due.is_empty() && working_set.is_empty() {
            tracing::info!("Nothing to download for {}", hostname);
            return Ok(DownloadTally::default());
        }

        tracing::info!(
            "Crawling {}: {} due for re-download, {} new candidates",
            hostname,
            due.len(),
            working_set.len()
        );

        let mut tally = DownloadTally::default();
        self.session.download_all(&due, &mut tally).await?;
        self.session.download_all(&working_set, &mut tally).await?;

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anime::Anime;
    use crate::config::StoragePaths;
    use crate::crawler::convert::JsonAnimeConverter;
    use crate::crawler::finder::AlreadyDownloadedFinder;
    use crate::crawler::traits::{Downloader, HighestIdDetector};
    use crate::dcs::scheduler::DcsScheduler;
    use crate::dcs::store::DcsStore;
    use crate::dcs::weekly_bucket;
    use crate::dead_entries::{ConfiguredProviders, DeadEntriesRegistry};
    use crate::provider::test_support::tracked_provider;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FixedHighestId(u32);

    #[async_trait]
    impl HighestIdDetector for FixedHighestId {
        async fn detect_highest_id(&self) -> Result<u32> {
            Ok(self.0)
        }
    }

    struct JsonForEveryId;

    #[async_trait]
    impl Downloader for JsonForEveryId {
        async fn download(
            &self,
            id: &str,
            _on_dead_entry: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<String> {
            Ok(format!(r#"{{"title":"Entry {}"}}"#, id))
        }
    }

    fn crawler(dir: &TempDir, highest: u32, week: u32) -> (RangeCrawler, Arc<DcsStore>, StoragePaths) {
        let paths = StoragePaths::rooted_at(dir.path());
        let provider = Arc::new(tracked_provider());
        let dcs_store = Arc::new(DcsStore::new(&paths.dcs_dir));
        let dead_entries = Arc::new(DeadEntriesRegistry::new(
            paths.dead_entries_dir(),
            dcs_store.clone(),
            Box::new(ConfiguredProviders(vec![provider.clone()])),
        ));
        let schedule = Arc::new(DcsScheduler::with_fixed_week(dcs_store.clone(), week));

        let session = CrawlSession::new(
            provider.clone(),
            paths.clone(),
            Box::new(JsonForEveryId),
            Box::new(JsonAnimeConverter),
            dcs_store.clone(),
            dead_entries.clone(),
            schedule.clone(),
        );
        let selector = IntRangeSelector::new(
            provider,
            Box::new(FixedHighestId(highest)),
            schedule,
            dead_entries,
            AlreadyDownloadedFinder::new(paths.clone()),
        );
        (RangeCrawler::new(session, selector), dcs_store, paths)
    }

    #[tokio::test]
    async fn test_downloads_the_whole_range_on_a_fresh_run() {
        let dir = TempDir::new().unwrap();
        let (crawler, dcs_store, paths) = crawler(&dir, 3, 0);

        let tally = crawler.run().await.unwrap();
        assert_eq!(tally.saved, 3);

        let provider = tracked_provider();
        for id in ["1", "2", "3"] {
            assert!(paths
                .working_dir(&provider)
                .join(format!("{}.html", id))
                .is_file());
            assert!(dcs_store.contains(&provider, id));
        }
    }

    #[tokio::test]
    async fn test_due_entries_are_redownloaded_even_when_recorded() {
        let dir = TempDir::new().unwrap();
        let week = weekly_bucket("2");
        let (crawler, dcs_store, paths) = crawler(&dir, 3, week);

        // A record whose artifact is missing and whose bucket is this week.
        dcs_store
            .upsert(&tracked_provider(), "2", &Anime::with_title("Stale"))
            .unwrap();

        let tally = crawler.run().await.unwrap();
        assert!(tally.saved >= 1);

        let provider = tracked_provider();
        assert!(paths.working_dir(&provider).join("2.html").is_file());
        let record = dcs_store.read(&provider, "2").unwrap().unwrap();
        assert_eq!(record.anime.title, "Entry 2");
    }

    #[tokio::test]
    async fn test_empty_cycle_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let provider = tracked_provider();
        let (crawler, _, paths) = crawler(&dir, 2, 0);

        // Both artifacts already exist, nothing is due.
        let working_dir = paths.working_dir(&provider);
        std::fs::create_dir_all(&working_dir).unwrap();
        std::fs::write(working_dir.join("1.html"), "<html/>").unwrap();
        std::fs::write(working_dir.join("2.html"), "<html/>").unwrap();

        let before: Vec<_> = std::fs::read_dir(&working_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();

        let tally = crawler.run().await.unwrap();
        assert_eq!(tally.attempted(), 0);

        let after: Vec<_> = std::fs::read_dir(&working_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(before.len(), after.len());
        assert!(!paths.dcs_dir.join(provider.short_name()).exists());
    }
}
