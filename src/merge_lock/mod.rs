//! Merge-lock registry
//!
//! A merge lock is an operator-confirmed set of source URIs, one per involved
//! provider, known to denote the same anime. The collection of all locks is
//! pairwise disjoint: a URI belongs to at most one lock. Locks persist in a
//! single `merge.lock` file, one lock per line with its URIs space-separated,
//! URIs sorted within a line and lines sorted, so identical logical content
//! always serializes to byte-identical files.

use crate::{AnisinkError, Result};
use once_cell::sync::OnceCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File name of the merge-lock registry inside the download-control-state dir
pub const MERGE_LOCK_FILE: &str = "merge.lock";

type LockEntries = Vec<BTreeSet<String>>;

/// Accessor for the merge-lock file
///
/// The file is parsed lazily on first access and cached for the lifetime of
/// the accessor. All mutations happen under one mutex and rewrite the file
/// in full (single-writer discipline over a plain file).
pub struct MergeLockAccessor {
    file: PathBuf,
    state: OnceCell<Mutex<LockEntries>>,
}

impl MergeLockAccessor {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            state: OnceCell::new(),
        }
    }

    /// Returns true if the URI belongs to any merge lock
    pub fn is_part_of_merge_lock(&self, uri: &str) -> Result<bool> {
        let entries = self.loaded()?;
        Ok(entry_index(&entries, uri).is_some())
    }

    /// The merge lock containing the URI, empty if there is none
    pub fn merge_lock(&self, uri: &str) -> Result<BTreeSet<String>> {
        let entries = self.loaded()?;
        Ok(match entry_index(&entries, uri) {
            Some(idx) => entries[idx].clone(),
            None => BTreeSet::new(),
        })
    }

    /// All URIs across all merge locks
    pub fn all_sources_in_all_merge_lock_entries(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .loaded()?
            .iter()
            .flat_map(|entry| entry.iter().cloned())
            .collect())
    }

    /// Returns true iff every URI in the argument belongs to the same single
    /// merge lock
    ///
    /// An empty argument has no lock. URIs spanning two locks, or including
    /// one URI outside any lock, yield false.
    pub fn has_merge_lock(&self, uris: &BTreeSet<String>) -> Result<bool> {
        let mut iter = uris.iter();
        let first = match iter.next() {
            Some(first) => first,
            None => return Ok(false),
        };

        let entries = self.loaded()?;
        Ok(match entry_index(&entries, first) {
            Some(idx) => uris.is_subset(&entries[idx]),
            None => false,
        })
    }

    /// Adds a new merge lock
    ///
    /// No-op on an empty argument or when the argument set-equals an existing
    /// lock. Fatal when any URI already belongs to a different lock.
    pub fn add_merge_lock(&self, uris: BTreeSet<String>) -> Result<()> {
        if uris.is_empty() {
            return Ok(());
        }

        let mut entries = self.loaded()?;

        if entries.iter().any(|entry| *entry == uris) {
            return Ok(());
        }

        for uri in &uris {
            if entry_index(&entries, uri).is_some() {
                return Err(AnisinkError::MergeLockConflict { uri: uri.clone() });
            }
        }

        entries.push(uris);
        self.persist(&entries)
    }

    /// Substitutes a URI in place within its merge lock
    ///
    /// An old URI not part of any lock is a no-op. Fatal when the new URI
    /// already belongs to a different lock, which would break disjointness.
    pub fn replace_uri(&self, old: &str, new: &str) -> Result<()> {
        let mut entries = self.loaded()?;

        if let Some(idx) = entry_index(&entries, old) {
            match entry_index(&entries, new) {
                Some(other) if other != idx => {
                    return Err(AnisinkError::MergeLockConflict {
                        uri: new.to_string(),
                    });
                }
                _ => {}
            }
            entries[idx].remove(old);
            entries[idx].insert(new.to_string());
            self.persist(&entries)?;
        }

        Ok(())
    }

    /// Removes a URI from its merge lock
    ///
    /// The lock shrinks but survives, even as a singleton. A URI not part of
    /// any lock is a no-op.
    pub fn remove_entry(&self, uri: &str) -> Result<()> {
        let mut entries = self.loaded()?;

        if let Some(idx) = entry_index(&entries, uri) {
            entries[idx].remove(uri);
            if entries[idx].is_empty() {
                entries.remove(idx);
            }
            self.persist(&entries)?;
        }

        Ok(())
    }

    /// Loads the file on first access; later calls reuse the cached state
    fn loaded(&self) -> Result<MutexGuard<'_, LockEntries>> {
        let state = self.state.get_or_try_init(|| self.load().map(Mutex::new))?;
        Ok(state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn load(&self) -> Result<LockEntries> {
        if !self.file.is_file() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.file)?;
        let entries: LockEntries = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect();

        // Structural integrity: a URI in two entries is unrecoverable.
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for entry in &entries {
            for uri in entry {
                if !seen.insert(uri.clone()) {
                    duplicates.insert(uri.clone());
                }
            }
        }
        if !duplicates.is_empty() {
            return Err(AnisinkError::MergeLockDuplicates {
                uris: duplicates.into_iter().collect(),
            });
        }

        Ok(entries)
    }

    /// Rewrites the file fully sorted: URIs within an entry, then the lines
    fn persist(&self, entries: &LockEntries) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut lines: Vec<String> = entries
            .iter()
            .map(|entry| entry.iter().cloned().collect::<Vec<_>>().join(" "))
            .collect();
        lines.sort();

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        std::fs::write(&self.file, content)?;
        Ok(())
    }
}

fn entry_index(entries: &LockEntries, uri: &str) -> Option<usize> {
    entries.iter().position(|entry| entry.contains(uri))
}
