//! Dead-entries registry
//!
//! Per DCS-tracked provider, a durable set of identifiers confirmed gone at
//! the source. The logical set persists in three derived views which are
//! always regenerated together from the in-memory set: pretty JSON, minified
//! JSON and a zip of the minified file. Listing-only providers never receive
//! per-identifier dead markers; for them, absence of the DCS record is the
//! dead signal.

use crate::dcs::store::DcsStore;
use crate::provider::{Provider, ProviderKind};
use crate::{AnisinkError, Result};
use once_cell::sync::OnceCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;
use zip::write::SimpleFileOptions;

/// Source of the configured provider set
///
/// Resolved lazily exactly once per registry; the result is cached for the
/// lifetime of the process.
pub trait ProviderSource: Send + Sync {
    fn providers(&self) -> Vec<Arc<Provider>>;
}

/// Provider source backed by an already resolved configuration
pub struct ConfiguredProviders(pub Vec<Arc<Provider>>);

impl ProviderSource for ConfiguredProviders {
    fn providers(&self) -> Vec<Arc<Provider>> {
        self.0.clone()
    }
}

/// Accessor for the per-provider dead-entries files
pub struct DeadEntriesRegistry {
    /// `<output-dir>/dead-entries`
    dir: PathBuf,
    dcs_store: Arc<DcsStore>,
    source: Box<dyn ProviderSource>,
    providers: OnceCell<Vec<Arc<Provider>>>,
}

impl DeadEntriesRegistry {
    pub fn new(
        dir: impl Into<PathBuf>,
        dcs_store: Arc<DcsStore>,
        source: Box<dyn ProviderSource>,
    ) -> Self {
        Self {
            dir: dir.into(),
            dcs_store,
            source,
            providers: OnceCell::new(),
        }
    }

    fn known_providers(&self) -> &[Arc<Provider>] {
        self.providers.get_or_init(|| self.source.providers())
    }

    fn pretty_file(&self, provider: &Provider) -> PathBuf {
        self.dir.join(format!("{}.json", provider.short_name()))
    }

    fn minified_file(&self, provider: &Provider) -> PathBuf {
        self.dir
            .join(format!("{}-minified.json", provider.short_name()))
    }

    fn zip_file(&self, provider: &Provider) -> PathBuf {
        self.dir.join(format!("{}.zip", provider.short_name()))
    }

    fn ensure_supported(&self, provider: &Provider) -> Result<()> {
        match provider.kind {
            ProviderKind::DcsTracked => Ok(()),
            ProviderKind::ListingOnly => Err(AnisinkError::UnsupportedProvider {
                hostname: provider.hostname.clone(),
            }),
        }
    }

    /// Marks an identifier as permanently gone
    ///
    /// Idempotent: an identifier already in the set is a no-op. Otherwise all
    /// three persisted views are regenerated as one logical update and the
    /// corresponding DCS record is removed.
    pub fn add_dead_entry(&self, provider: &Provider, id: &str) -> Result<()> {
        self.ensure_supported(provider)?;

        let mut entries: BTreeSet<String> =
            self.fetch_dead_entries(provider)?.into_iter().collect();
        if entries.insert(id.to_string()) {
            self.write_all_views(provider, &entries)?;
            tracing::info!("Registered dead entry {} for {}", id, provider.hostname);
        }

        self.dcs_store.remove(provider, id)
    }

    /// Loads the dead-entries set of a provider from the minified view
    ///
    /// A provider without persisted files has an empty set.
    pub fn fetch_dead_entries(&self, provider: &Provider) -> Result<HashSet<String>> {
        self.ensure_supported(provider)?;

        let file = self.minified_file(provider);
        if !file.is_file() {
            return Ok(HashSet::new());
        }

        let content = std::fs::read_to_string(&file)?;
        let ids: Vec<String> = serde_json::from_str(&content)?;
        Ok(ids.into_iter().collect())
    }

    /// Classifies a batch of source URIs as dead or alive
    ///
    /// DCS-tracked providers: a URI is dead if its identifier is in the
    /// persisted set. Listing-only providers: a URI is dead if no DCS record
    /// exists for it. A URI whose host matches no configured provider is a
    /// configuration error.
    pub fn determine_dead_entries(&self, uris: &[Url]) -> Result<HashSet<Url>> {
        let providers = self.known_providers().to_vec();
        let mut dead_sets: HashMap<String, HashSet<String>> = HashMap::new();
        let mut dead = HashSet::new();

        for uri in uris {
            let provider = providers
                .iter()
                .find(|p| p.owns(uri))
                .ok_or_else(|| AnisinkError::UnknownProvider {
                    uri: uri.to_string(),
                })?;

            let id = provider.extract_id(uri)?;
            let is_dead = match provider.kind {
                ProviderKind::DcsTracked => {
                    if !dead_sets.contains_key(&provider.hostname) {
                        let set = self.fetch_dead_entries(provider)?;
                        dead_sets.insert(provider.hostname.clone(), set);
                    }
                    dead_sets[&provider.hostname].contains(&id)
                }
                ProviderKind::ListingOnly => !self.dcs_store.contains(provider, &id),
            };

            if is_dead {
                dead.insert(uri.clone());
            }
        }

        Ok(dead)
    }

    /// Regenerates all three persisted views from the in-memory set
    fn write_all_views(&self, provider: &Provider, entries: &BTreeSet<String>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let ordered: Vec<&String> = entries.iter().collect();
        let minified = serde_json::to_string(&ordered)?;
        let pretty = serde_json::to_string_pretty(&ordered)?;

        std::fs::write(self.pretty_file(provider), &pretty)?;
        std::fs::write(self.minified_file(provider), &minified)?;

        let minified_name = format!("{}-minified.json", provider.short_name());
        let zip_out = std::fs::File::create(self.zip_file(provider))?;
        let mut zip = zip::ZipWriter::new(zip_out);
        zip.start_file(minified_name, SimpleFileOptions::default())?;
        zip.write_all(minified.as_bytes())?;
        zip.finish()?;

        Ok(())
    }
}
