//! Per-provider crawl session
//!
//! One session owns everything needed to turn an identifier into durable
//! state: the downloader, the converter, the raw artifact directory, the
//! download-control-state store and the dead-entries registry. The selectors
//! decide WHICH identifiers to attempt; the session performs the attempt.

use crate::config::StoragePaths;
use crate::crawler::finder::AlreadyDownloadedFinder;
use crate::crawler::traits::{AnimeConverter, Downloader};
use crate::dcs::scheduler::WeeklySchedule;
use crate::dcs::store::DcsStore;
use crate::dead_entries::DeadEntriesRegistry;
use crate::provider::{Provider, ProviderKind};
use crate::Result;
use std::sync::Arc;

/// What happened to one download attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Raw artifact persisted and DCS record upserted
    Saved,

    /// The entry no longer exists at the provider; dead-entry state updated,
    /// nothing persisted
    Dead,

    /// The provider returned a blank body; nothing persisted, the entry will
    /// be retried on a later run
    Empty,
}

/// Running totals of one provider's crawl cycle
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadTally {
    pub saved: usize,
    pub dead: usize,
    pub empty: usize,
}

impl DownloadTally {
    fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Saved => self.saved += 1,
            DownloadOutcome::Dead => self.dead += 1,
            DownloadOutcome::Empty => self.empty += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.saved + self.dead + self.empty
    }
}

/// Download execution for one provider
pub struct CrawlSession {
    provider: Arc<Provider>,
    paths: StoragePaths,
    downloader: Box<dyn Downloader>,
    converter: Box<dyn AnimeConverter>,
    dcs_store: Arc<DcsStore>,
    dead_entries: Arc<DeadEntriesRegistry>,
    schedule: Arc<dyn WeeklySchedule>,
    finder: AlreadyDownloadedFinder,
}

impl CrawlSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<Provider>,
        paths: StoragePaths,
        downloader: Box<dyn Downloader>,
        converter: Box<dyn AnimeConverter>,
        dcs_store: Arc<DcsStore>,
        dead_entries: Arc<DeadEntriesRegistry>,
        schedule: Arc<dyn WeeklySchedule>,
    ) -> Self {
        let finder = AlreadyDownloadedFinder::new(paths.clone());
        Self {
            provider,
            paths,
            downloader,
            converter,
            dcs_store,
            dead_entries,
            schedule,
            finder,
        }
    }

    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// Identifiers due for mandatory re-download this week
    ///
    /// The due set minus identifiers whose raw artifact already exists,
    /// sorted for deterministic processing order.
    pub fn due_for_redownload(&self) -> Result<Vec<String>> {
        let due = self
            .schedule
            .entries_scheduled_for_current_week(&self.provider)?;
        let downloaded = self.finder.already_downloaded(&self.provider)?;

        let mut ids: Vec<String> = due.difference(&downloaded).cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Downloads one entry and persists the result
    ///
    /// A dead signal from the downloader updates dead-entry state according
    /// to the provider's kind: DCS-tracked providers get a registry entry,
    /// listing-only providers lose their DCS record. No raw artifact is
    /// written in either case. A blank body leaves no trace at all.
    pub async fn download_entry(&self, id: &str) -> Result<DownloadOutcome> {
        let mut dead = false;
        let body = {
            let mut on_dead = |_id: &str| dead = true;
            self.downloader.download(id, &mut on_dead).await?
        };

        if dead {
            match self.provider.kind {
                ProviderKind::DcsTracked => {
                    self.dead_entries.add_dead_entry(&self.provider, id)?;
                }
                ProviderKind::ListingOnly => {
                    self.dcs_store.remove(&self.provider, id)?;
                }
            }
            return Ok(DownloadOutcome::Dead);
        }

        if body.trim().is_empty() {
            tracing::warn!(
                "Blank response for {} on {}, will retry on a later run",
                id,
                self.provider.hostname
            );
            return Ok(DownloadOutcome::Empty);
        }

        let working_dir = self.paths.working_dir(&self.provider);
        std::fs::create_dir_all(&working_dir)?;
        std::fs::write(working_dir.join(self.provider.raw_file_name(id)), &body)?;

        let anime = self.converter.convert(id, &body)?;
        self.dcs_store.upsert(&self.provider, id, &anime)?;

        Ok(DownloadOutcome::Saved)
    }

    /// Downloads a batch sequentially, accumulating the tally
    pub async fn download_all(&self, ids: &[String], tally: &mut DownloadTally) -> Result<()> {
        for id in ids {
            let outcome = self.download_entry(id).await?;
            tally.record(outcome);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anime::Anime;
    use crate::crawler::convert::JsonAnimeConverter;
    use crate::dcs::scheduler::DcsScheduler;
    use crate::dcs::weekly_bucket;
    use crate::dead_entries::ConfiguredProviders;
    use crate::provider::test_support::{listing_provider, tracked_provider};
    use crate::AnisinkError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tempfile::TempDir;

    enum Canned {
        Body(String),
        Dead,
        Blank,
    }

    struct CannedDownloader {
        responses: HashMap<String, Canned>,
    }

    #[async_trait]
    impl Downloader for CannedDownloader {
        async fn download(
            &self,
            id: &str,
            on_dead_entry: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<String> {
            match self.responses.get(id) {
                Some(Canned::Body(body)) => Ok(body.clone()),
                Some(Canned::Blank) => Ok("  \n".to_string()),
                Some(Canned::Dead) | None => {
                    on_dead_entry(id);
                    Ok(String::new())
                }
            }
        }
    }

    struct Fixture {
        _dir: TempDir,
        paths: StoragePaths,
        dcs_store: Arc<DcsStore>,
        dead_entries: Arc<DeadEntriesRegistry>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let paths = StoragePaths::rooted_at(dir.path());
            let dcs_store = Arc::new(DcsStore::new(&paths.dcs_dir));
            let dead_entries = Arc::new(DeadEntriesRegistry::new(
                paths.dead_entries_dir(),
                dcs_store.clone(),
                Box::new(ConfiguredProviders(vec![
                    Arc::new(tracked_provider()),
                    Arc::new(listing_provider()),
                ])),
            ));
            Self {
                _dir: dir,
                paths,
                dcs_store,
                dead_entries,
            }
        }

        fn session(
            &self,
            provider: Provider,
            responses: HashMap<String, Canned>,
            week: u32,
        ) -> CrawlSession {
            CrawlSession::new(
                Arc::new(provider),
                self.paths.clone(),
                Box::new(CannedDownloader { responses }),
                Box::new(JsonAnimeConverter),
                self.dcs_store.clone(),
                self.dead_entries.clone(),
                Arc::new(DcsScheduler::with_fixed_week(self.dcs_store.clone(), week)),
            )
        }
    }

    #[tokio::test]
    async fn test_saved_entry_persists_artifact_and_dcs_record() {
        let fixture = Fixture::new();
        let responses = HashMap::from([(
            "26".to_string(),
            Canned::Body(r#"{"title":"Texhnolyze","episodes":22}"#.to_string()),
        )]);
        let session = fixture.session(tracked_provider(), responses, 0);

        let outcome = session.download_entry("26").await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Saved);

        let provider = tracked_provider();
        let artifact = fixture.paths.working_dir(&provider).join("26.html");
        assert!(artifact.is_file());

        let record = fixture.dcs_store.read(&provider, "26").unwrap().unwrap();
        assert_eq!(record.anime.title, "Texhnolyze");
    }

    #[tokio::test]
    async fn test_dead_entry_on_tracked_provider_hits_the_registry() {
        let fixture = Fixture::new();
        let provider = tracked_provider();
        fixture
            .dcs_store
            .upsert(&provider, "9", &Anime::with_title("Soon gone"))
            .unwrap();

        let responses = HashMap::from([("9".to_string(), Canned::Dead)]);
        let session = fixture.session(tracked_provider(), responses, 0);

        let outcome = session.download_entry("9").await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Dead);

        let dead = fixture.dead_entries.fetch_dead_entries(&provider).unwrap();
        assert!(dead.contains("9"));
        assert!(!fixture.dcs_store.contains(&provider, "9"));
        assert!(!fixture.paths.working_dir(&provider).join("9.html").exists());
    }

    #[tokio::test]
    async fn test_dead_entry_on_listing_only_provider_drops_the_record() {
        let fixture = Fixture::new();
        let provider = listing_provider();
        fixture
            .dcs_store
            .upsert(&provider, "vanished", &Anime::with_title("Vanished"))
            .unwrap();

        let responses = HashMap::from([("vanished".to_string(), Canned::Dead)]);
        let session = fixture.session(listing_provider(), responses, 0);

        let outcome = session.download_entry("vanished").await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Dead);
        assert!(!fixture.dcs_store.contains(&provider, "vanished"));
    }

    #[tokio::test]
    async fn test_blank_body_leaves_no_trace() {
        let fixture = Fixture::new();
        let responses = HashMap::from([("7".to_string(), Canned::Blank)]);
        let session = fixture.session(tracked_provider(), responses, 0);

        let outcome = session.download_entry("7").await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Empty);

        let provider = tracked_provider();
        assert!(!fixture.paths.working_dir(&provider).join("7.html").exists());
        assert!(!fixture.dcs_store.contains(&provider, "7"));
    }

    #[tokio::test]
    async fn test_unconvertible_body_is_fatal_and_keeps_the_artifact_out_of_dcs() {
        let fixture = Fixture::new();
        let responses = HashMap::from([(
            "8".to_string(),
            Canned::Body("<html>not json</html>".to_string()),
        )]);
        let session = fixture.session(tracked_provider(), responses, 0);

        let err = session.download_entry("8").await.unwrap_err();
        assert!(matches!(err, AnisinkError::Json(_)));
        assert!(!fixture.dcs_store.contains(&tracked_provider(), "8"));
    }

    #[tokio::test]
    async fn test_due_for_redownload_excludes_existing_artifacts() {
        let fixture = Fixture::new();
        let provider = tracked_provider();
        fixture
            .dcs_store
            .upsert(&provider, "2", &Anime::with_title("Two"))
            .unwrap();

        let week = weekly_bucket("2");
        let session = fixture.session(tracked_provider(), HashMap::new(), week);
        assert_eq!(session.due_for_redownload().unwrap(), vec!["2".to_string()]);

        let working_dir = fixture.paths.working_dir(&provider);
        std::fs::create_dir_all(&working_dir).unwrap();
        std::fs::write(working_dir.join("2.html"), "<html/>").unwrap();
        assert!(session.due_for_redownload().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_all_tallies_outcomes() {
        let fixture = Fixture::new();
        let responses = HashMap::from([
            (
                "1".to_string(),
                Canned::Body(r#"{"title":"One"}"#.to_string()),
            ),
            ("2".to_string(), Canned::Dead),
            ("3".to_string(), Canned::Blank),
        ]);
        let session = fixture.session(tracked_provider(), responses, 0);

        let ids: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let mut tally = DownloadTally::default();
        session.download_all(&ids, &mut tally).await.unwrap();

        assert_eq!(tally.saved, 1);
        assert_eq!(tally.dead, 1);
        assert_eq!(tally.empty, 1);
        assert_eq!(tally.attempted(), 3);
    }
}
