use async_trait::async_trait;
use thiserror::Error;

use super::normalize::RawRecord;
use super::partition::PartitionKey;

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Upstream fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    RequestFailed(String),

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Account credentials for one listing call
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Per-partition page size, clamped to `1..=max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    /// Parse the caller's `per` value the way `parseInt` reads it: optional
    /// sign, then the leading digits (`10abc` is 10, `1.5` is 1). Missing,
    /// non-numeric or non-positive input falls back to `default`, then the
    /// result is capped at `max`.
    pub fn parse(raw: Option<&str>, default: u32, max: u32) -> Self {
        let requested = raw
            .and_then(leading_integer)
            .filter(|n| *n > 0)
            .map(|n| n.min(u32::MAX as i64) as u32)
            .unwrap_or(default);

        Self(requested.min(max).max(1))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }

    // Overlong digit runs saturate; the caller caps at `max` anyway
    let value = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

/// One page request against one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub partition: PartitionKey,
    /// Provider cursor; empty starts from the beginning
    pub token: String,
    pub page_size: PageSize,
    pub folder: String,
    /// Name prefix filter; `None` lists the whole folder
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionPage {
    pub records: Vec<RawRecord>,
    /// Provider cursor for the next page; empty when exhausted
    pub next_token: String,
}

/// Source of partition pages (the upstream search API, or a stub in tests)
#[async_trait]
pub trait PartitionSource: Send + Sync {
    /// Perform exactly one upstream page request
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        query: &PageQuery,
    ) -> Result<PartitionPage, FetchError>;
}
