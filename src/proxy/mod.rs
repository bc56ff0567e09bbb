//! HTTP server module.
//!
//! This module exposes the relay over HTTP: `POST /run` accepts a prompt and
//! answers with the provider's text, `GET /health` reports the configured
//! provider.

mod handlers;
mod server;
pub mod types;

pub use handlers::{
    RELAY_LATENCY_MS_HEADER, RELAY_PROVIDER_HEADER, RELAY_REQUEST_ID_HEADER,
};
pub use server::{create_router, run_server, AppState, LISTEN_ADDR};
pub use types::{RunRequest, RunResponse};
