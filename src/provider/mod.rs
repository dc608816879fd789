//! HTTP client for the upstream resources search API

mod expression;

pub use expression::search_expression;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::listing::{
    Credentials, FetchError, PageQuery, PartitionPage, PartitionSource, RawRecord,
};

/// Upstream error bodies are cut to this many characters in diagnostics
const MAX_ERROR_BODY_CHARS: usize = 512;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloudinary.com".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("quotelist/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl From<&ProviderConfig> for HttpConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    expression: String,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<&'a str>,
    sort_by: [SortField; 1],
}

#[derive(Debug, Serialize)]
struct SortField {
    public_id: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<serde_json::Value>,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Partition source backed by `POST /v1_1/{cloud}/resources/search`
pub struct SearchClient {
    client: Client,
    base_url: String,
}

impl SearchClient {
    pub fn new(config: HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, cloud_name: &str) -> String {
        format!("{}/v1_1/{}/resources/search", self.base_url, cloud_name)
    }
}

#[async_trait]
impl PartitionSource for SearchClient {
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        query: &PageQuery,
    ) -> Result<PartitionPage, FetchError> {
        let body = SearchRequest {
            expression: search_expression(query),
            max_results: query.page_size.get(),
            next_cursor: Some(query.token.as_str()).filter(|t| !t.is_empty()),
            sort_by: [SortField { public_id: "desc" }],
        };

        debug!(partition = %query.partition, expression = %body.expression, "Searching upstream");

        let response = self
            .client
            .post(self.search_url(&credentials.cloud_name))
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

        let received = data.resources.len();
        let records: Vec<RawRecord> = data
            .resources
            .into_iter()
            .filter_map(RawRecord::from_value)
            .collect();

        if records.len() < received {
            warn!(
                partition = %query.partition,
                skipped = received - records.len(),
                "Skipping upstream records that are not objects"
            );
        }

        debug!(
            partition = %query.partition,
            records = records.len(),
            "Upstream page received"
        );

        Ok(PartitionPage {
            records,
            next_token: data.next_cursor.unwrap_or_default(),
        })
    }
}

fn status_error(status: StatusCode, body: String) -> FetchError {
    let body = if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let mut cut: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        cut.push('…');
        cut
    } else {
        body
    };

    FetchError::Status {
        status: status.as_u16(),
        body,
    }
}
