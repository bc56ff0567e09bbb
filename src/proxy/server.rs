//! HTTP server setup and configuration.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::Config;
use crate::relay::Relay;

/// Fixed listen address of the relay.
pub const LISTEN_ADDR: &str = "0.0.0.0:3005";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state with a relay created from `config`.
    pub fn from_config(config: Config) -> crate::Result<Self> {
        let config = Arc::new(config);
        let relay = Relay::from_config(config.clone())?;
        Ok(Self {
            relay: Arc::new(relay),
            config,
        })
    }
}

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let max_concurrency = state.config.max_concurrency;

    Router::new()
        .route("/run", post(handlers::run))
        .route("/health", get(handlers::health))
        // State and middleware
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(max_concurrency))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;

    let provider = state.config.provider.map(|p| p.as_str()).unwrap_or("none");
    tracing::info!(
        provider = %provider,
        base_url = %state.config.base_url,
        model = %state.config.model,
        timeout_secs = state.config.request_timeout.as_secs(),
        max_concurrency = state.config.max_concurrency,
        "Relay configured"
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR).await?;
    tracing::info!(address = %LISTEN_ADDR, "Starting prompt relay server");

    axum::serve(listener, app).await?;

    Ok(())
}
