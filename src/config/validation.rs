use crate::config::types::{Config, EndpointConfig, FetchConfig, OutputConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// Runs before any network activity; a configuration problem is the only
/// thing that fails a harvest outright.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_fetch_config(&config.fetch)?;
    validate_endpoint_config(&config.endpoints)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the discovery space
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    validate_terms("keywords", &config.keywords)?;
    validate_terms("locations", &config.locations)?;

    if config.pages < 1 {
        return Err(ConfigError::Validation(format!(
            "pages must be >= 1, got {}",
            config.pages
        )));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    // the last page's `start` offset must fit in a u32
    if (config.pages - 1).checked_mul(config.page_size).is_none() {
        return Err(ConfigError::Validation(format!(
            "pages * page_size overflows the listing offset ({} * {})",
            config.pages, config.page_size
        )));
    }

    Ok(())
}

fn validate_terms(name: &str, terms: &[String]) -> Result<(), ConfigError> {
    if terms.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} must contain at least one entry",
            name
        )));
    }

    if terms.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "{} cannot contain blank entries",
            name
        )));
    }

    Ok(())
}

/// Validates the detail fetch policy
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    // 2^31 overflows the backoff multiplier
    if config.max_attempts > 31 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be <= 31, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the listing and detail endpoints
fn validate_endpoint_config(config: &EndpointConfig) -> Result<(), ConfigError> {
    validate_endpoint("listing_url", &config.listing_url)?;
    validate_endpoint("detail_url", &config.detail_url)?;
    Ok(())
}

fn validate_endpoint(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' cannot be used as a base URL",
            name, value
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
