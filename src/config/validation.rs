use crate::config::types::{Config, HttpConfig, ProviderEntry, StorageConfig};
use crate::provider::{ID_PLACEHOLDER, PAGE_PLACEHOLDER};
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_storage_config(&config.storage)?;
    validate_http_config(&config.http)?;
    validate_providers(&config.providers)?;
    Ok(())
}

/// Validates the storage directories
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("download-dir", &config.download_dir),
        (
            "download-control-state-dir",
            &config.download_control_state_dir,
        ),
        ("output-dir", &config.output_dir),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }
    Ok(())
}

/// Validates the HTTP configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the provider list
fn validate_providers(providers: &[ProviderEntry]) -> Result<(), ConfigError> {
    if providers.is_empty() {
        return Err(ConfigError::Validation(
            "at least one provider must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in providers {
        if !seen.insert(entry.hostname.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider hostname '{}'",
                entry.hostname
            )));
        }
        validate_provider(entry)?;
    }

    Ok(())
}

/// Validates a single provider entry
fn validate_provider(entry: &ProviderEntry) -> Result<(), ConfigError> {
    if entry.hostname.is_empty() {
        return Err(ConfigError::Validation(
            "provider hostname cannot be empty".to_string(),
        ));
    }

    match entry.kind.as_str() {
        "dcs-tracked" | "listing-only" => {}
        other => {
            return Err(ConfigError::Validation(format!(
                "provider '{}': kind must be 'dcs-tracked' or 'listing-only', got '{}'",
                entry.hostname, other
            )));
        }
    }

    if entry.raw_file_suffix.is_empty() || entry.raw_file_suffix.starts_with('.') {
        return Err(ConfigError::Validation(format!(
            "provider '{}': raw-file-suffix must be non-empty and without a leading dot",
            entry.hostname
        )));
    }

    validate_link_template(&entry.hostname, "anime-link", &entry.anime_link, ID_PLACEHOLDER)?;
    validate_link_template(
        &entry.hostname,
        "data-download-link",
        &entry.data_download_link,
        ID_PLACEHOLDER,
    )?;
    if let Some(listing) = &entry.listing_link {
        validate_link_template(&entry.hostname, "listing-link", listing, PAGE_PLACEHOLDER)?;
    }

    for pattern in [&entry.highest_id_pattern, &entry.entry_pattern]
        .into_iter()
        .flatten()
    {
        Regex::new(pattern)?;
    }

    validate_crawl_mode(entry)
}

/// Validates the per-mode requirements of a provider entry
fn validate_crawl_mode(entry: &ProviderEntry) -> Result<(), ConfigError> {
    let require = |field: &Option<String>, name: &str| -> Result<(), ConfigError> {
        if field.is_none() {
            return Err(ConfigError::Validation(format!(
                "provider '{}': crawl mode '{}' requires {}",
                entry.hostname, entry.crawl, name
            )));
        }
        Ok(())
    };

    match entry.crawl.as_str() {
        "id-range" => {
            require(&entry.newest_probe_link, "newest-probe-link")?;
            require(&entry.highest_id_pattern, "highest-id-pattern")?;
        }
        "pages" | "seasons" => {
            require(&entry.listing_link, "listing-link")?;
            require(&entry.entry_pattern, "entry-pattern")?;
            require(&entry.newest_probe_link, "newest-probe-link")?;
            require(&entry.highest_id_pattern, "highest-id-pattern")?;
            if entry.crawl == "seasons" && entry.first_year.is_none() {
                return Err(ConfigError::Validation(format!(
                    "provider '{}': crawl mode 'seasons' requires first-year",
                    entry.hostname
                )));
            }
        }
        other => {
            return Err(ConfigError::Validation(format!(
                "provider '{}': crawl must be 'id-range', 'pages' or 'seasons', got '{}'",
                entry.hostname, other
            )));
        }
    }

    Ok(())
}

/// Validates a URL template: the placeholder must be present and the template
/// with a probe identifier substituted must parse as an absolute URL
fn validate_link_template(
    hostname: &str,
    name: &str,
    template: &str,
    placeholder: &str,
) -> Result<(), ConfigError> {
    if !template.contains(placeholder) {
        return Err(ConfigError::Validation(format!(
            "provider '{}': {} must contain the {} placeholder",
            hostname, name, placeholder
        )));
    }

    let probe = template.replace(placeholder, "1");
    Url::parse(&probe).map_err(|e| {
        ConfigError::InvalidUrl(format!("provider '{}': invalid {}: {}", hostname, name, e))
    })?;

    Ok(())
}
