use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{models::ListQuery, state::AppState, utils::resolve_base_url};
use crate::api::error::ApiError;
use crate::listing::{PageRequest, PageSize};

/// Listing endpoint (GET /list)
///
/// Queries every partition once, resuming each from the cursor packed into
/// `next`, and returns the merged page newest first together with the token
/// for the following call.
///
/// ## Flow:
/// 1. Read account credentials from configuration (500 if incomplete)
/// 2. Parse `per` (default 50, capped at 100) and `noprefix`
/// 3. Resolve the link base URL (config, then forwarded headers)
/// 4. Run the aggregation; a malformed `next` restarts every partition
pub async fn list_resources(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = Uuid::now_v7();

    async move {
        let credentials = state.config.provider.credentials()?;
        let listing = &state.config.listing;

        let request = PageRequest {
            token: query.next.clone().unwrap_or_default(),
            page_size: PageSize::parse(
                query.per.as_deref(),
                listing.default_page_size,
                listing.max_page_size,
            ),
            prefix_filter: query.prefix_filter(),
            base_url: resolve_base_url(listing.site_base_url.as_deref(), &headers),
        };

        let page = state.lister.list_page(&credentials, &request).await?;

        Ok::<_, ApiError>((StatusCode::OK, Json(page)))
    }
    .instrument(info_span!("list", %request_id))
    .await
}

/// Health check endpoint (GET /health)
///
/// Reports static component status plus the listing counters. The upstream
/// account is reported as `unconfigured` (not unhealthy) when credentials
/// are missing, since listing calls will fail until they are supplied.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());

    let provider = if state.config.provider.credentials().is_ok() {
        "configured"
    } else {
        "unconfigured"
    };
    components.insert("provider".to_string(), provider.to_string());

    let response = super::models::HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
