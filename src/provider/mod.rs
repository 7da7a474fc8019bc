//! Provider descriptions and the identifier codec
//!
//! A provider is one external anime-information site. Its configuration is
//! immutable for the lifetime of a run and defines the URL builders, the raw
//! file suffix and whether the provider tracks dead entries per identifier
//! (`DcsTracked`) or is fully discovered by periodic listings (`ListingOnly`).

use crate::{AnisinkError, Result};
use url::Url;

/// Placeholder substituted with an entry identifier in link templates
pub const ID_PLACEHOLDER: &str = "{id}";

/// Placeholder substituted with a page cursor in listing link templates
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// How a provider establishes entry liveness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Dense per-identifier entries; removed entries are recorded explicitly
    /// in the dead-entries registry.
    DcsTracked,

    /// Identity is established purely by presence in periodic full listings;
    /// there is no per-identifier dead marker.
    ListingOnly,
}

/// Immutable description of one provider
#[derive(Debug, Clone)]
pub struct Provider {
    /// Hostname of the provider, e.g. `example.org`
    pub hostname: String,

    /// Liveness model of this provider
    pub kind: ProviderKind,

    /// Suffix of persisted raw artifacts, without the leading dot
    pub raw_file_suffix: String,

    /// Canonical entry URL template containing `{id}`
    pub anime_link_template: String,

    /// Raw data download URL template containing `{id}`
    pub data_download_link_template: String,

    /// Listing page URL template containing `{page}`, for paginated providers
    pub listing_link_template: Option<String>,

    /// Body marker that signals a listing page without entries
    pub no_entries_marker: Option<String>,
}

impl Provider {
    /// Returns the provider's short name: the hostname up to the first dot
    ///
    /// Used as directory and file name component for all per-provider state.
    pub fn short_name(&self) -> &str {
        self.hostname.split('.').next().unwrap_or(&self.hostname)
    }

    /// Builds the canonical entry URL for an identifier
    pub fn anime_link(&self, id: &str) -> Result<Url> {
        let raw = self.anime_link_template.replace(ID_PLACEHOLDER, id);
        Ok(Url::parse(&raw)?)
    }

    /// Builds the raw data download URL for an identifier
    pub fn data_download_link(&self, id: &str) -> Result<Url> {
        let raw = self.data_download_link_template.replace(ID_PLACEHOLDER, id);
        Ok(Url::parse(&raw)?)
    }

    /// Builds the listing page URL for a page cursor
    ///
    /// Fails when the provider has no listing link configured.
    pub fn listing_link(&self, page: &str) -> Result<Url> {
        let template = self.listing_link_template.as_deref().ok_or_else(|| {
            AnisinkError::UnsupportedProvider {
                hostname: self.hostname.clone(),
            }
        })?;
        let raw = template.replace(PAGE_PLACEHOLDER, page);
        Ok(Url::parse(&raw)?)
    }

    /// Returns true if the URI belongs to this provider
    pub fn owns(&self, uri: &Url) -> bool {
        uri.host_str() == Some(self.hostname.as_str())
    }

    /// Extracts the entry identifier from a canonical entry URL
    ///
    /// This is the inverse of [`anime_link`](Self::anime_link): the template
    /// is split at the `{id}` placeholder and the URI must carry the
    /// resulting prefix and suffix with a non-empty identifier in between.
    pub fn extract_id(&self, uri: &Url) -> Result<String> {
        let (prefix, suffix) = self
            .anime_link_template
            .split_once(ID_PLACEHOLDER)
            .unwrap_or((self.anime_link_template.as_str(), ""));

        let raw = uri.as_str();
        let id = raw
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
            .filter(|id| !id.is_empty());

        match id {
            Some(id) => Ok(id.to_string()),
            None => Err(AnisinkError::IdentifierExtraction {
                hostname: self.hostname.clone(),
                uri: raw.to_string(),
            }),
        }
    }

    /// File name of the raw artifact for an identifier
    pub fn raw_file_name(&self, id: &str) -> String {
        format!("{}.{}", id, self.raw_file_suffix)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::tracked_provider;
    use super::*;

    #[test]
    fn test_short_name_cuts_at_first_dot() {
        let provider = tracked_provider();
        assert_eq!(provider.short_name(), "example");

        let mut sub = tracked_provider();
        sub.hostname = "anime.list.example.com".to_string();
        assert_eq!(sub.short_name(), "anime");
    }

    #[test]
    fn test_anime_link_substitutes_identifier() {
        let provider = tracked_provider();
        let link = provider.anime_link("1535").unwrap();
        assert_eq!(link.as_str(), "https://example.org/anime/1535");
    }

    #[test]
    fn test_extract_id_inverts_anime_link() {
        let provider = tracked_provider();
        let link = provider.anime_link("monogatari-second-season").unwrap();
        assert_eq!(
            provider.extract_id(&link).unwrap(),
            "monogatari-second-season"
        );
    }

    #[test]
    fn test_extract_id_rejects_foreign_uri() {
        let provider = tracked_provider();
        let uri = Url::parse("https://other.example.net/anime/1535").unwrap();

        let err = provider.extract_id(&uri).unwrap_err();
        assert!(matches!(err, AnisinkError::IdentifierExtraction { .. }));
    }

    #[test]
    fn test_extract_id_rejects_empty_identifier() {
        let provider = tracked_provider();
        let uri = Url::parse("https://example.org/anime/").unwrap();

        assert!(provider.extract_id(&uri).is_err());
    }

    #[test]
    fn test_owns_matches_hostname_only() {
        let provider = tracked_provider();
        let own = Url::parse("https://example.org/anything").unwrap();
        let foreign = Url::parse("https://example.com/anime/1").unwrap();

        assert!(provider.owns(&own));
        assert!(!provider.owns(&foreign));
    }

    #[test]
    fn test_raw_file_name_appends_suffix() {
        let provider = tracked_provider();
        assert_eq!(provider.raw_file_name("42"), "42.html");
    }
}
