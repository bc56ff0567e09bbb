//! Provider dispatch for a single prompt.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::upstream::{
    ChatCompletionRequest, ChatCompletionResponse, GenerateRequest, GenerateResponse,
};
use crate::config::{Config, Provider};
use crate::error::{Error, Result};

/// Answer given when no provider is configured.
pub const FALLBACK_MESSAGE: &str =
    "No valid LLM provider configured. Please check your .env file.";

/// Sampling temperature sent with every chat completion.
pub const CHAT_TEMPERATURE: f64 = 0.2;

/// Create the outbound HTTP client with the configured timeouts.
pub fn build_http_client(config: &Config) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .build()
}

/// Forwards prompts to the configured provider.
///
/// Holds no mutable state; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Relay {
    config: Arc<Config>,
    http_client: Client,
}

impl Relay {
    /// Create a relay around an existing client.
    pub fn new(config: Arc<Config>, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Create a relay with a client built from the configuration.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let http_client = build_http_client(&config)
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::new(config, http_client))
    }

    /// The configuration this relay dispatches on.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forward `prompt` to the configured provider and return its text.
    ///
    /// Makes exactly one outbound call, or none when no provider is
    /// configured. The prompt is forwarded as-is, including when empty.
    pub async fn relay(&self, prompt: &str) -> Result<String> {
        match self.config.provider {
            Some(Provider::LocalGeneration) => self.generate(prompt).await,
            Some(Provider::ChatCompletion) => self.chat(prompt).await,
            None => {
                tracing::warn!("No LLM provider configured, returning fallback message");
                Ok(FALLBACK_MESSAGE.to_string())
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let provider = Provider::LocalGeneration;
        let payload = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let body = self.post(provider, &payload).await?;
        let parsed: GenerateResponse = decode(provider, &body)?;
        Ok(parsed.response)
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let provider = Provider::ChatCompletion;
        let payload =
            ChatCompletionRequest::single_user_turn(&self.config.model, prompt, CHAT_TEMPERATURE);

        let body = self.post(provider, &payload).await?;
        let parsed: ChatCompletionResponse = decode(provider, &body)?;
        parsed.into_first_content().ok_or_else(|| {
            tracing::error!(provider = %provider, "Response has no choices[0].message.content");
            Error::MalformedResponse {
                provider,
                message: "no content in choices[0].message".to_string(),
            }
        })
    }

    /// Send one JSON POST to the provider endpoint and return the raw 2xx body.
    async fn post<T: Serialize + ?Sized>(&self, provider: Provider, payload: &T) -> Result<Bytes> {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            provider.endpoint_path()
        );

        tracing::debug!(
            provider = %provider,
            url = %url,
            model = %self.config.model,
            "Forwarding prompt"
        );

        let mut request = self
            .http_client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(payload);

        if provider == Provider::ChatCompletion {
            if let Some(api_key) = &self.config.api_key {
                request = request.header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", api_key.expose_secret()),
                );
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = error_body_text(provider, response.text().await);
            tracing::error!(
                status = %status,
                provider = %provider,
                body = %error_body,
                "Provider returned error"
            );
            return Err(Error::UpstreamStatus {
                provider,
                status: status.as_u16(),
                body: error_body,
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| self.transport_error(provider, e))
    }

    /// The limit that expired: the connect timeout while connecting, the
    /// total request timeout otherwise.
    fn exceeded_timeout(&self, during_connect: bool) -> Duration {
        if during_connect {
            self.config.connect_timeout
        } else {
            self.config.request_timeout
        }
    }

    fn transport_error(&self, provider: Provider, source: reqwest::Error) -> Error {
        if source.is_timeout() {
            let timeout = self.exceeded_timeout(source.is_connect());
            tracing::error!(
                provider = %provider,
                connect = source.is_connect(),
                timeout_secs = timeout.as_secs_f64(),
                "Provider timed out"
            );
            Error::UpstreamTimeout { provider, timeout }
        } else {
            tracing::error!(error = %source, provider = %provider, "Failed to reach provider");
            Error::UpstreamUnavailable { provider, source }
        }
    }
}

/// Body text of a non-2xx answer; a failed read is logged and reported in place of the body.
fn error_body_text(provider: Provider, read: reqwest::Result<String>) -> String {
    match read {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, provider = %provider, "Failed to read provider error body");
            format!("<unreadable body: {}>", e)
        }
    }
}

fn decode<T: DeserializeOwned>(provider: Provider, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!(error = %e, provider = %provider, "Failed to parse provider response");
        Error::MalformedResponse {
            provider,
            message: e.to_string(),
        }
    })
}
