//! HTTP request handlers.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::Instrument;
use uuid::Uuid;

use super::server::AppState;
use super::types::{RunRequest, RunResponse};
use crate::config::Provider;

/// Response header: correlation ID (UUID v4).
pub const RELAY_REQUEST_ID_HEADER: &str = "x-relay-request-id";
/// Response header: wall-clock latency in milliseconds (integer).
pub const RELAY_LATENCY_MS_HEADER: &str = "x-relay-latency-ms";
/// Response header: provider token that handled the request.
pub const RELAY_PROVIDER_HEADER: &str = "x-relay-provider";

/// Attach relay metadata headers to a response.
///
/// Request id and latency are always set; the provider header only when a
/// provider is configured.
fn attach_relay_headers(
    response: &mut Response,
    request_id: &str,
    latency_ms: u64,
    provider: Option<Provider>,
) {
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(HeaderName::from_static(RELAY_REQUEST_ID_HEADER), value);
    }
    headers.insert(
        HeaderName::from_static(RELAY_LATENCY_MS_HEADER),
        HeaderValue::from(latency_ms),
    );
    if let Some(provider) = provider {
        headers.insert(
            HeaderName::from_static(RELAY_PROVIDER_HEADER),
            HeaderValue::from_static(provider.as_str()),
        );
    }
}

/// Handle POST /run
pub async fn run(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let start = std::time::Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let provider = state.config.provider;
    let span = tracing::info_span!("run", request_id = %request_id);

    let result: crate::Result<String> = async {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let request = RunRequest::from_body(content_type, &body)?;
        tracing::info!(
            provider = ?provider.map(Provider::as_str),
            prompt_chars = request.prompt.chars().count(),
            "Received run request"
        );
        state.relay.relay(&request.prompt).await
    }
    .instrument(span.clone())
    .await;

    let latency_ms = start.elapsed().as_millis() as u64;

    let mut response = match result {
        Ok(text) => {
            span.in_scope(|| {
                tracing::info!(
                    latency_ms,
                    result_chars = text.chars().count(),
                    "Relay succeeded"
                )
            });
            Json(RunResponse { result: text }).into_response()
        }
        Err(e) => {
            span.in_scope(|| {
                tracing::warn!(latency_ms, kind = e.kind(), error = %e, "Relay failed")
            });
            e.into_response()
        }
    };

    attach_relay_headers(&mut response, &request_id, latency_ms, provider);
    response
}

/// Handle GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = if state.config.provider.is_some() {
        "ok"
    } else {
        "unconfigured"
    };

    Json(serde_json::json!({
        "status": status,
        "service": "prompt-relay",
        "provider": state.config.provider.map(Provider::as_str),
        "model": state.config.model,
    }))
}
