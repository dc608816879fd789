use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::listing::{
    Credentials, DEFAULT_PAGE_SIZE, FailurePolicy, ListingError, ListingOptions, MAX_PAGE_SIZE,
};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Upstream asset store account and client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub cloud_name: Option<String>,
    /// API key (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// API secret (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_secret: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProviderConfig {
    /// Account credentials for one call; fails naming every missing field
    pub fn credentials(&self) -> Result<Credentials, ListingError> {
        fn present(value: &Option<String>) -> Option<&String> {
            value.as_ref().filter(|v| !v.trim().is_empty())
        }

        match (
            present(&self.cloud_name),
            present(&self.api_key),
            present(&self.api_secret),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Credentials {
                cloud_name: cloud_name.clone(),
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            }),
            (cloud_name, api_key, api_secret) => {
                let missing = [
                    ("cloud_name", cloud_name.is_none()),
                    ("api_key", api_key.is_none()),
                    ("api_secret", api_secret.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();

                Err(ListingError::ConfigurationMissing(missing))
            }
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    concat!("quotelist/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Listing behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    /// Upstream folder holding the listed resources
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Name prefix applied unless the caller passes `noprefix=1`
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Fixed base URL for item links; derived from request headers when unset
    #[serde(default)]
    pub site_base_url: Option<String>,
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    #[serde(default = "default_partition_timeout_ms")]
    pub partition_timeout_ms: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            prefix: default_prefix(),
            site_base_url: None,
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            partition_timeout_ms: default_partition_timeout_ms(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl ListingConfig {
    pub fn options(&self) -> ListingOptions {
        ListingOptions {
            folder: self.folder.clone(),
            prefix: self.prefix.clone(),
            partition_timeout: Duration::from_millis(self.partition_timeout_ms),
            failure_policy: self.failure_policy,
        }
    }
}

fn default_folder() -> String {
    "quotes".to_string()
}

fn default_prefix() -> String {
    "q-".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_partition_timeout_ms() -> u64 {
    10_000
}
