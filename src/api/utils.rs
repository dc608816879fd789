//! API utility functions
//!
//! Pure, stateless helpers for deriving the link base URL from a request.

use axum::http::{HeaderMap, header};

/// First comma-separated value of a header, trimmed
fn first_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Site root as seen by the client, honouring reverse-proxy headers
///
/// Uses `X-Forwarded-Proto` (default `https`) and `X-Forwarded-Host`, falling
/// back to `Host`. Returns `None` when no host is known.
pub fn base_url_from_headers(headers: &HeaderMap) -> Option<String> {
    let proto = first_value(headers, "x-forwarded-proto").unwrap_or("https");
    let host = first_value(headers, "x-forwarded-host")
        .or_else(|| first_value(headers, header::HOST.as_str()))?;

    Some(format!("{proto}://{host}/"))
}

/// Configured base URL wins; otherwise derive from the request, else relative
pub fn resolve_base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    configured
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .or_else(|| base_url_from_headers(headers))
        .unwrap_or_default()
}
