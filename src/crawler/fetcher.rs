//! HTTP implementations of the crawler's collaborator seams

use crate::crawler::traits::{
    Downloader, EntryExtractor, HighestIdDetector, PageFetcher, PageResponse,
};
use crate::provider::Provider;
use crate::{AnisinkError, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builds the HTTP client shared by all providers of a run
pub fn build_http_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Plain GET fetcher for listing pages
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<PageResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| AnisinkError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| AnisinkError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(PageResponse { status, body })
    }
}

/// Downloader hitting the provider's data download link
///
/// HTTP 404 and 410 are the dead-entry signals; any other error status is a
/// hard failure surfaced to the crawler.
pub struct HttpDownloader {
    client: Client,
    provider: Arc<Provider>,
}

impl HttpDownloader {
    pub fn new(client: Client, provider: Arc<Provider>) -> Self {
        Self { client, provider }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        id: &str,
        on_dead_entry: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<String> {
        let url = self.provider.data_download_link(id)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| AnisinkError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.as_u16() == 404 || status.as_u16() == 410 {
            tracing::info!("Entry {} no longer exists on {}", id, self.provider.hostname);
            on_dead_entry(id);
            return Ok(String::new());
        }

        let response = response.error_for_status().map_err(|source| AnisinkError::Http {
            url: url.to_string(),
            source,
        })?;

        let body = response.text().await.map_err(|source| AnisinkError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(body)
    }
}

/// Upper-bound detector probing a fixed page with a capture-group regex
///
/// All matches of the pattern's first capture group are parsed as integers
/// and the maximum wins; a page without matches yields 0, which the selectors
/// reject as a non-positive highest ID.
pub struct RegexHighestIdDetector {
    fetcher: HttpPageFetcher,
    probe_url: Url,
    pattern: Regex,
}

impl RegexHighestIdDetector {
    pub fn new(client: Client, probe_url: Url, pattern: Regex) -> Self {
        Self {
            fetcher: HttpPageFetcher::new(client),
            probe_url,
            pattern,
        }
    }
}

#[async_trait]
impl HighestIdDetector for RegexHighestIdDetector {
    async fn detect_highest_id(&self) -> Result<u32> {
        let response = self.fetcher.fetch(&self.probe_url).await?;

        let highest = self
            .pattern
            .captures_iter(&response.body)
            .filter_map(|captures| captures.get(1))
            .filter_map(|group| group.as_str().parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        tracing::debug!("Detected upper bound {} at {}", highest, self.probe_url);
        Ok(highest)
    }
}

/// Entry extractor matching a capture-group regex against the page body
///
/// Duplicate matches collapse to the first occurrence; a body without any
/// match means the entries could not be located.
pub struct RegexEntryExtractor {
    pattern: Regex,
}

impl RegexEntryExtractor {
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl EntryExtractor for RegexEntryExtractor {
    fn extract(&self, body: &str) -> Option<Vec<String>> {
        let mut ids = Vec::new();
        for captures in self.pattern.captures_iter(body) {
            if let Some(group) = captures.get(1) {
                let id = group.as_str().to_string();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }

        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }
}
