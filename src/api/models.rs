//! API models for the listing endpoint
//!
//! `GET /list?per=20&next=<token>&noprefix=1` returns one merged page:
//!
//! ```json
//! {
//!   "items": [
//!     {
//!       "id": "q-1234.pdf",
//!       "public_id": "quotes/q-1234.pdf",
//!       "created_at": "2024-05-01T10:00:00Z",
//!       "bytes": 20480,
//!       "format": "pdf",
//!       "filename": "q-1234",
//!       "resource_type": "raw",
//!       "type": "upload",
//!       "link": "https://example.com/?cid=q-1234.pdf"
//!     }
//!   ],
//!   "next": "eyJ2IjoxLCJjdXJzb3JzIjp7fX0"
//! }
//! ```
//!
//! Errors are returned as `{ "error": "...", "code": "...", "detail": "..." }`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::observability::MetricsSnapshot;

/// Query string of `GET /list`
///
/// `per` stays a string so bad input falls back to the default instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub per: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub noprefix: Option<String>,
}

impl ListQuery {
    pub fn prefix_filter(&self) -> bool {
        self.noprefix.as_deref() != Some("1")
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub metrics: MetricsSnapshot,
}
