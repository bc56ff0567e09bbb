//! Configuration loading and validation for prompt-relay.
//!
//! Settings come from the process environment and are read once at startup
//! into an immutable [`Config`] that is handed to the relay explicitly.

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Selects the dispatch branch (`ollama` or `openai`).
pub const PROVIDER_VAR: &str = "LLM_PROVIDER";
/// Root URL of the upstream API.
pub const BASE_URL_VAR: &str = "LLM_BASE_URL";
/// Model identifier passed upstream.
pub const MODEL_VAR: &str = "LLM_MODEL";
/// Optional bearer token for the chat-completion provider.
pub const API_KEY_VAR: &str = "LLM_API_KEY";
/// Total timeout for one outbound call, in seconds.
pub const TIMEOUT_VAR: &str = "LLM_TIMEOUT_SECS";
/// Connect timeout for one outbound call, in seconds.
pub const CONNECT_TIMEOUT_VAR: &str = "LLM_CONNECT_TIMEOUT_SECS";
/// Maximum number of inbound requests processed at once.
pub const MAX_CONCURRENCY_VAR: &str = "RELAY_MAX_CONCURRENCY";

/// Dotenv file read from the working directory at startup.
pub const ENV_FILE: &str = ".env";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_CONCURRENCY: usize = 64;

/// Upstream API shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Ollama-style `POST /api/generate`.
    LocalGeneration,
    /// OpenAI-compatible `POST /chat/completions` (LM Studio, vLLM, ...).
    ChatCompletion,
}

impl Provider {
    /// Configuration token for this provider.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::LocalGeneration => "ollama",
            Provider::ChatCompletion => "openai",
        }
    }

    /// Path appended to the base URL for the single outbound call.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Provider::LocalGeneration => "/api/generate",
            Provider::ChatCompletion => "/chat/completions",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ollama" => Ok(Provider::LocalGeneration),
            "openai" => Ok(Provider::ChatCompletion),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// What to do when `LLM_PROVIDER` is missing or not a recognized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderPolicy {
    /// Refuse to start.
    #[default]
    Strict,
    /// Start anyway; every relay answers with the fallback message.
    AllowUnconfigured,
}

/// API key wrapper that redacts in Debug/Display and zeroizes on drop.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Access the raw key value. Every call site is auditable via `grep expose_secret`.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        ApiKey(SecretString::from(s))
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        ApiKey(SecretString::from(s))
    }
}

/// Process-wide relay configuration. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` only when started with [`ProviderPolicy::AllowUnconfigured`].
    pub provider: Option<Provider>,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<ApiKey>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_concurrency: usize,
}

impl Config {
    /// Build a configuration for `provider` with default timeouts and limits.
    pub fn new(
        provider: Option<Provider>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env(policy: ProviderPolicy) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), policy)
    }

    /// Load configuration from the process environment, with `.env` in the
    /// working directory as a lower-priority source when that file exists.
    pub fn from_env_or_dotenv(policy: ProviderPolicy) -> Result<Self, ConfigError> {
        if Path::new(ENV_FILE).is_file() {
            Self::from_env_file(ENV_FILE, policy)
        } else {
            Self::from_env(policy)
        }
    }

    /// Load configuration from a dotenv file plus the process environment.
    ///
    /// Variables already set in the environment win over the file, matching
    /// the usual dotenv semantics.
    pub fn from_env_file(
        path: impl AsRef<Path>,
        policy: ProviderPolicy,
    ) -> Result<Self, ConfigError> {
        Self::from_env_file_with(path, |name| std::env::var(name).ok(), policy)
    }

    /// Load configuration from a dotenv file, consulting `lookup` first.
    pub fn from_env_file_with<F>(
        path: impl AsRef<Path>,
        lookup: F,
        policy: ProviderPolicy,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_env_file(path.as_ref())?;
        tracing::info!(
            path = %path.as_ref().display(),
            vars = file_vars.len(),
            "Loaded dotenv file"
        );

        Self::from_lookup(
            |name| lookup(name).or_else(|| file_vars.get(name).cloned()),
            policy,
        )
    }

    /// Load configuration using a custom variable lookup.
    ///
    /// The closure-based design keeps tests away from global env state.
    pub fn from_lookup<F>(lookup: F, policy: ProviderPolicy) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_provider = lookup(PROVIDER_VAR).unwrap_or_default();
        let provider = match raw_provider.parse::<Provider>() {
            Ok(provider) => Some(provider),
            Err(e) => match policy {
                ProviderPolicy::Strict => return Err(e),
                ProviderPolicy::AllowUnconfigured => {
                    tracing::warn!(
                        value = %raw_provider,
                        "Unrecognized LLM provider - relay will answer with the fallback message"
                    );
                    None
                }
            },
        };

        let config = Self {
            provider,
            base_url: lookup(BASE_URL_VAR).unwrap_or_default(),
            model: lookup(MODEL_VAR).unwrap_or_default(),
            api_key: lookup(API_KEY_VAR)
                .filter(|key| !key.is_empty())
                .map(ApiKey::from),
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                TIMEOUT_VAR,
                DEFAULT_TIMEOUT_SECS,
            )?),
            connect_timeout: Duration::from_secs(parse_var(
                &lookup,
                CONNECT_TIMEOUT_VAR,
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            max_concurrency: parse_var(&lookup, MAX_CONCURRENCY_VAR, DEFAULT_MAX_CONCURRENCY)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than zero",
                TIMEOUT_VAR
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than zero",
                CONNECT_TIMEOUT_VAR
            )));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be greater than zero",
                MAX_CONCURRENCY_VAR
            )));
        }

        let Some(provider) = self.provider else {
            return Ok(());
        };

        if self.base_url.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} is required for provider '{}'",
                BASE_URL_VAR, provider
            )));
        }

        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            var: BASE_URL_VAR.to_string(),
            value: self.base_url.clone(),
            message: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                var: BASE_URL_VAR.to_string(),
                value: self.base_url.clone(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if self.model.is_empty() {
            tracing::warn!(provider = %provider, "{} is empty - upstream may reject requests", MODEL_VAR);
        }

        Ok(())
    }
}

/// Read all `KEY=value` pairs of a dotenv file without touching the process env.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_file_error = |source| ConfigError::EnvFile {
        path: path.display().to_string(),
        source,
    };

    dotenvy::from_path_iter(path)
        .map_err(env_file_error)?
        .map(|item| item.map_err(env_file_error))
        .collect()
}

/// Parse an optional variable, falling back to `default` when unset or empty.
fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    var: var.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unrecognized LLM provider '{0}' (expected \"ollama\" or \"openai\")")]
    UnknownProvider(String),

    #[error("Invalid value '{value}' for {var}: {message}")]
    InvalidValue {
        var: String,
        value: String,
        message: String,
    },

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Failed to read env file '{path}': {source}")]
    EnvFile {
        path: String,
        #[source]
        source: dotenvy::Error,
    },
}
