//! File-backed store of download-control-state records
//!
//! Records live under `<dcs-dir>/<provider short name>/<identifier>.dcs`,
//! one JSON document per identifier. Records are created on first successful
//! crawl, overwritten on every subsequent crawl and deleted when the
//! identifier is confirmed dead.

use crate::anime::Anime;
use crate::provider::Provider;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File suffix of download-control-state records, without the leading dot
pub const DCS_FILE_SUFFIX: &str = "dcs";

/// One durable download-control-state record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcsEntry {
    /// Provider-scoped entry identifier
    pub id: String,

    /// Last normalized anime snapshot for this identifier
    pub anime: Anime,
}

/// Accessor for the download-control-state directory
#[derive(Debug, Clone)]
pub struct DcsStore {
    dcs_dir: PathBuf,
}

impl DcsStore {
    pub fn new(dcs_dir: impl Into<PathBuf>) -> Self {
        Self {
            dcs_dir: dcs_dir.into(),
        }
    }

    /// Directory holding all records of one provider
    pub fn provider_dir(&self, provider: &Provider) -> PathBuf {
        self.dcs_dir.join(provider.short_name())
    }

    fn entry_file(&self, provider: &Provider, id: &str) -> PathBuf {
        self.provider_dir(provider)
            .join(format!("{}.{}", id, DCS_FILE_SUFFIX))
    }

    /// Creates or overwrites the record for an identifier
    pub fn upsert(&self, provider: &Provider, id: &str, anime: &Anime) -> Result<()> {
        let entry = DcsEntry {
            id: id.to_string(),
            anime: anime.clone(),
        };

        let file = self.entry_file(provider, id);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, serde_json::to_string(&entry)?)?;

        tracing::debug!("Updated DCS record for {} on {}", id, provider.hostname);
        Ok(())
    }

    /// Reads the record for an identifier, `None` if there is none
    pub fn read(&self, provider: &Provider, id: &str) -> Result<Option<DcsEntry>> {
        let file = self.entry_file(provider, id);
        if !file.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&file)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Returns true if a record exists for the identifier
    pub fn contains(&self, provider: &Provider, id: &str) -> bool {
        self.entry_file(provider, id).is_file()
    }

    /// Deletes the record for an identifier; a missing record is a no-op
    pub fn remove(&self, provider: &Provider, id: &str) -> Result<()> {
        let file = self.entry_file(provider, id);
        if file.is_file() {
            std::fs::remove_file(&file)?;
            tracing::debug!("Removed DCS record for {} on {}", id, provider.hostname);
        }
        Ok(())
    }

    /// All identifiers with a record for this provider
    pub fn all_ids(&self, provider: &Provider) -> Result<HashSet<String>> {
        collect_ids(&self.provider_dir(provider), DCS_FILE_SUFFIX)
    }

    /// The highest numeric identifier present in any record, 0 if none
    pub fn highest_id(&self, provider: &Provider) -> Result<u32> {
        let highest = self
            .all_ids(provider)?
            .iter()
            .filter_map(|id| id.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(highest)
    }
}

/// Collects file stems with the given suffix from a directory
///
/// A missing directory yields an empty set: no records exist yet.
pub(crate) fn collect_ids(dir: &Path, suffix: &str) -> Result<HashSet<String>> {
    let mut ids = HashSet::new();
    if !dir.is_dir() {
        return Ok(ids);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(suffix) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.insert(stem.to_string());
        }
    }

    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::test_support::tracked_provider;
    use tempfile::TempDir;

    fn store() -> (TempDir, DcsStore) {
        let dir = TempDir::new().unwrap();
        let store = DcsStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_upsert_then_read_round_trips() {
        let (_dir, store) = store();
        let provider = tracked_provider();
        let anime = Anime::with_title("Planetes");

        store.upsert(&provider, "329", &anime).unwrap();

        let entry = store.read(&provider, "329").unwrap().unwrap();
        assert_eq!(entry.id, "329");
        assert_eq!(entry.anime, anime);
    }

    #[test]
    fn test_read_missing_record_is_none() {
        let (_dir, store) = store();
        let provider = tracked_provider();

        assert!(store.read(&provider, "1").unwrap().is_none());
        assert!(!store.contains(&provider, "1"));
    }

    #[test]
    fn test_upsert_overwrites_previous_snapshot() {
        let (_dir, store) = store();
        let provider = tracked_provider();

        store
            .upsert(&provider, "7", &Anime::with_title("Old title"))
            .unwrap();
        store
            .upsert(&provider, "7", &Anime::with_title("New title"))
            .unwrap();

        let entry = store.read(&provider, "7").unwrap().unwrap();
        assert_eq!(entry.anime.title, "New title");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, store) = store();
        let provider = tracked_provider();

        store
            .upsert(&provider, "5", &Anime::with_title("Gone"))
            .unwrap();
        store.remove(&provider, "5").unwrap();
        store.remove(&provider, "5").unwrap();

        assert!(!store.contains(&provider, "5"));
    }

    #[test]
    fn test_all_ids_lists_only_dcs_files() {
        let (_dir, store) = store();
        let provider = tracked_provider();

        store.upsert(&provider, "1", &Anime::with_title("A")).unwrap();
        store.upsert(&provider, "2", &Anime::with_title("B")).unwrap();
        std::fs::write(store.provider_dir(&provider).join("stray.txt"), "x").unwrap();

        let ids = store.all_ids(&provider).unwrap();
        assert_eq!(
            ids,
            HashSet::from(["1".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn test_highest_id_ignores_non_numeric_identifiers() {
        let (_dir, store) = store();
        let provider = tracked_provider();

        store.upsert(&provider, "3", &Anime::with_title("A")).unwrap();
        store.upsert(&provider, "41", &Anime::with_title("B")).unwrap();
        store
            .upsert(&provider, "some-slug", &Anime::with_title("C"))
            .unwrap();

        assert_eq!(store.highest_id(&provider).unwrap(), 41);
    }

    #[test]
    fn test_highest_id_is_zero_without_records() {
        let (_dir, store) = store();
        let provider = tracked_provider();
        assert_eq!(store.highest_id(&provider).unwrap(), 0);
    }

    #[test]
    fn test_providers_use_disjoint_directories() {
        let (_dir, store) = store();
        let tracked = tracked_provider();
        let listing = crate::provider::test_support::listing_provider();

        store.upsert(&tracked, "1", &Anime::with_title("A")).unwrap();

        assert!(store.all_ids(&listing).unwrap().is_empty());
    }
}
