//! Normalized anime model
//!
//! The per-provider converters (external to this subsystem) produce this
//! normalized record from a raw artifact. The download-control-state store
//! persists the latest snapshot per (provider, identifier).

use serde::{Deserialize, Serialize};

/// A normalized anime record as produced by a provider converter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anime {
    /// Primary title as published by the provider
    pub title: String,

    /// Broad format classification
    #[serde(default)]
    pub anime_type: AnimeType,

    /// Number of episodes, 0 if unknown
    #[serde(default)]
    pub episodes: u32,

    /// Airing status
    #[serde(default)]
    pub status: AnimeStatus,

    /// Source URIs this record was derived from (absolute URLs)
    #[serde(default)]
    pub sources: Vec<String>,
}

impl Anime {
    /// Creates a record carrying only a title, everything else unknown
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            anime_type: AnimeType::Unknown,
            episodes: 0,
            status: AnimeStatus::Unknown,
            sources: Vec::new(),
        }
    }
}

/// Format classification of an anime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimeType {
    Tv,
    Movie,
    Ova,
    Ona,
    Special,
    #[default]
    Unknown,
}

/// Airing status of an anime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnimeStatus {
    Finished,
    Ongoing,
    Upcoming,
    #[default]
    Unknown,
}
