use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "QUOTELIST_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/quotelist.toml";
const ENV_PREFIX: &str = "QUOTELIST";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    apply_env(&mut config, |name| env::var(name).ok());

    Ok(config)
}

/// Apply secrets and the flat account variables understood by earlier
/// deployments. Secrets are never stored in TOML files, only in environment.
fn apply_env(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

    if let Some(api_key) = lookup("CLOUDINARY_API_KEY") {
        config.provider.api_key = Some(api_key);
    }
    if let Some(api_secret) = lookup("CLOUDINARY_API_SECRET") {
        config.provider.api_secret = Some(api_secret);
    }
    if let Some(cloud_name) = lookup("CLOUDINARY_CLOUD_NAME") {
        config.provider.cloud_name = Some(cloud_name);
    }
    if let Some(folder) = lookup("CLOUDINARY_FOLDER") {
        config.listing.folder = folder;
    }
    if let Some(prefix) = lookup("QUOTE_PREFIX") {
        config.listing.prefix = prefix;
    }
    if let Some(base_url) = lookup("SITE_BASE_URL") {
        config.listing.site_base_url = Some(base_url);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // QUOTELIST__LISTING__MAX_PAGE_SIZE -> listing.max_page_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
