//! Collaborator seams of the crawler
//!
//! The per-provider scraping concerns live behind these traits: how a raw
//! artifact is downloaded, how a listing page is fetched, how candidate
//! identifiers are located in a page body, how the provider's upper bound is
//! probed and how a raw artifact becomes a normalized anime record. The
//! orchestration in this crate only depends on the traits.

use crate::anime::Anime;
use crate::Result;
use async_trait::async_trait;
use url::Url;

/// Downloads the raw artifact body of one entry
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetches the raw body for an identifier
    ///
    /// Invokes `on_dead_entry` synchronously before returning when the
    /// response indicates the entry no longer exists at the provider. An
    /// empty or blank body means there is nothing to persist.
    async fn download(
        &self,
        id: &str,
        on_dead_entry: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String>;
}

/// Probes the provider's current upper bound
#[async_trait]
pub trait HighestIdDetector: Send + Sync {
    /// The highest entry identifier, highest listing page or newest year,
    /// depending on the provider's crawl mode
    async fn detect_highest_id(&self) -> Result<u32>;
}

/// Response of a listing page fetch
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// Fetches listing pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<PageResponse>;
}

/// Locates candidate entry identifiers in a listing page body
pub trait EntryExtractor: Send + Sync {
    /// The identifiers found on the page, `None` when the body carries no
    /// locatable entries at all (which callers treat as fatal)
    fn extract(&self, body: &str) -> Option<Vec<String>>;
}

/// Turns a raw artifact into a normalized anime record
pub trait AnimeConverter: Send + Sync {
    fn convert(&self, id: &str, raw: &str) -> Result<Anime>;
}
