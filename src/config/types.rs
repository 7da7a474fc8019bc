use serde::Deserialize;

/// Main configuration structure for Anisink
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub http: HttpConfig,
    #[serde(rename = "provider", default)]
    pub providers: Vec<ProviderEntry>,
}

/// Locations of all durable state
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one working directory per provider with raw artifacts
    #[serde(rename = "download-dir")]
    pub download_dir: String,

    /// Directory holding download-control-state records and merge.lock
    #[serde(rename = "download-control-state-dir")]
    pub download_control_state_dir: String,

    /// Directory holding generated output, including dead-entries files
    #[serde(rename = "output-dir")]
    pub output_dir: String,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// One configured provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEntry {
    /// Hostname, e.g. "example.org"
    pub hostname: String,

    /// "dcs-tracked" or "listing-only"
    pub kind: String,

    /// How the working set is selected: "id-range", "pages" or "seasons"
    pub crawl: String,

    /// Raw artifact file suffix without the leading dot
    #[serde(rename = "raw-file-suffix")]
    pub raw_file_suffix: String,

    /// Canonical entry URL template containing `{id}`
    #[serde(rename = "anime-link")]
    pub anime_link: String,

    /// Raw data download URL template containing `{id}`
    #[serde(rename = "data-download-link")]
    pub data_download_link: String,

    /// Listing page URL template containing `{page}`
    #[serde(rename = "listing-link")]
    pub listing_link: Option<String>,

    /// Body marker signalling a listing page without entries
    #[serde(rename = "no-entries-marker")]
    pub no_entries_marker: Option<String>,

    /// URL probed to detect the highest identifier or newest year
    #[serde(rename = "newest-probe-link")]
    pub newest_probe_link: Option<String>,

    /// Regex with one capture group extracting the highest identifier or
    /// newest year from the probe page
    #[serde(rename = "highest-id-pattern")]
    pub highest_id_pattern: Option<String>,

    /// Regex with one capture group extracting entry identifiers from a
    /// listing page body
    #[serde(rename = "entry-pattern")]
    pub entry_pattern: Option<String>,

    /// First year enumerated by the season cursor
    #[serde(rename = "first-year")]
    pub first_year: Option<u32>,

    /// Whether the season cursor appends the "tba" sentinel
    #[serde(rename = "include-tba", default)]
    pub include_tba: bool,
}
