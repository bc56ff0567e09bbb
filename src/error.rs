//! Error types for prompt-relay.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::Provider;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for prompt-relay.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Failed to reach {provider} provider: {source}")]
    UpstreamUnavailable {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} provider did not answer within {}s", .timeout.as_secs_f64())]
    UpstreamTimeout {
        provider: Provider,
        timeout: Duration,
    },

    #[error("{provider} provider returned {status}: {body}")]
    UpstreamStatus {
        provider: Provider,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {provider} provider: {message}")]
    MalformedResponse { provider: Provider, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Machine-readable error kind, reported as `error.type` in responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "bad_request",
            Error::UpstreamUnavailable { .. } => "upstream_unavailable",
            Error::UpstreamTimeout { .. } => "upstream_timeout",
            Error::UpstreamStatus { .. } => "upstream_status",
            Error::MalformedResponse { .. } => "malformed_response",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status returned to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Error::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            Error::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // OpenAI-style error envelope
        let body = serde_json::json!({
            "error": {
                "message": self.to_string(),
                "type": self.kind(),
                "code": status.as_u16()
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn error_body(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_malformed_response_maps_to_bad_gateway() {
        let (status, json) = error_body(Error::MalformedResponse {
            provider: Provider::LocalGeneration,
            message: "missing field `response`".to_string(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["error"]["type"], "malformed_response");
        assert_eq!(json["error"]["code"], 502);
        let message = json["error"]["message"].as_str().unwrap();
        assert!(message.contains("ollama"), "message: {}", message);
        assert!(message.contains("response"), "message: {}", message);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_gateway_timeout() {
        let (status, json) = error_body(Error::UpstreamTimeout {
            provider: Provider::ChatCompletion,
            timeout: Duration::from_secs(120),
        })
        .await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json["error"]["type"], "upstream_timeout");
        assert_eq!(
            json["error"]["message"],
            "openai provider did not answer within 120s"
        );
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_400() {
        let (status, json) = error_body(Error::BadRequest("not json".to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["type"], "bad_request");
        assert_eq!(json["error"]["message"], "Invalid request: not json");
    }

    #[test]
    fn test_upstream_status_message_includes_body() {
        let err = Error::UpstreamStatus {
            provider: Provider::LocalGeneration,
            status: 404,
            body: r#"{"error":"model 'llama9' not found"}"#.to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("llama9"));
    }
}
