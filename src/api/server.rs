use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{health, list_resources},
    state::AppState,
};
use crate::config::Config;
use crate::provider::{HttpConfig, SearchClient};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the router for a prepared state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/list", get(list_resources))
        .route("/api/list", get(list_resources))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    info!(
        api_base_url = %config.provider.api_base_url,
        folder = %config.listing.folder,
        failure_policy = ?config.listing.failure_policy,
        "Initializing upstream search client"
    );
    let client = SearchClient::new(HttpConfig::from(&config.provider))
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let state = AppState::new(config, Arc::new(client));
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "quotelist API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
