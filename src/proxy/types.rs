//! Request and response bodies of the `/run` endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Inbound `/run` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunRequest {
    pub prompt: String,
}

/// Outbound `/run` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RunResponse {
    pub result: String,
}

impl RunRequest {
    /// Extract the prompt from a raw request body.
    ///
    /// Only an `application/json` body is parsed; any other or missing
    /// content type leaves the body unread and yields the empty prompt.
    /// An empty JSON body, a missing `prompt`, a non-string `prompt`, or a
    /// JSON value that is not an object also yield the empty prompt. Only a
    /// JSON body that does not parse is rejected.
    pub fn from_body(content_type: Option<&str>, body: &[u8]) -> Result<Self> {
        if !content_type.is_some_and(is_json_media_type) {
            return Ok(Self::default());
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::BadRequest(format!("Request body is not valid JSON: {}", e)))?;

        let prompt = value
            .get("prompt")
            .and_then(|p| p.as_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self { prompt })
    }
}

/// `application/json`, ignoring parameters such as `charset`.
fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|media_type| media_type.eq_ignore_ascii_case("application/json"))
}
