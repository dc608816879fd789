use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Page size must be positive: {field} = {value}")]
    InvalidPageSize { field: String, value: u32 },

    #[error("default_page_size ({default}) exceeds max_page_size ({max})")]
    DefaultExceedsMax { default: u32, max: u32 },

    #[error("Timeout must be positive: {field}")]
    InvalidTimeout { field: String },

    #[error("Invalid provider API base URL '{url}', expected http:// or https://")]
    InvalidApiBaseUrl { url: String },

    #[error("Listing folder must not be empty")]
    EmptyFolder,
}

/// Validate the entire configuration
///
/// Account credentials are deliberately not checked here: a missing account
/// is reported per request so the server can still start and serve health.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_provider(config)?;
    validate_listing(config)?;
    Ok(())
}

fn validate_provider(config: &Config) -> Result<(), ValidationError> {
    let url = &config.provider.api_base_url;
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ValidationError::InvalidApiBaseUrl { url: url.clone() });
    }

    for (field, value) in [
        ("provider.connect_timeout_ms", config.provider.connect_timeout_ms),
        ("provider.request_timeout_ms", config.provider.request_timeout_ms),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidTimeout {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_listing(config: &Config) -> Result<(), ValidationError> {
    let listing = &config.listing;

    if listing.folder.trim().is_empty() {
        return Err(ValidationError::EmptyFolder);
    }

    for (field, value) in [
        ("listing.default_page_size", listing.default_page_size),
        ("listing.max_page_size", listing.max_page_size),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidPageSize {
                field: field.to_string(),
                value,
            });
        }
    }

    if listing.default_page_size > listing.max_page_size {
        return Err(ValidationError::DefaultExceedsMax {
            default: listing.default_page_size,
            max: listing.max_page_size,
        });
    }

    if listing.partition_timeout_ms == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "listing.partition_timeout_ms".to_string(),
        });
    }

    Ok(())
}
