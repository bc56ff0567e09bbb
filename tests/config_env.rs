//! Integration test for loading configuration from the real process environment.
//!
//! Kept to a single test: the variable names are fixed, so parallel tests in
//! this binary would race on them.

use std::time::Duration;

use prompt_relay::config::{
    Config, ConfigError, ProviderPolicy, API_KEY_VAR, BASE_URL_VAR, MODEL_VAR, PROVIDER_VAR,
    TIMEOUT_VAR,
};
use prompt_relay::Provider;

#[test]
fn test_from_env_strict_and_lenient() {
    std::env::set_var(PROVIDER_VAR, "openai");
    std::env::set_var(BASE_URL_VAR, "http://localhost:1234/v1");
    std::env::set_var(MODEL_VAR, "local-model");
    std::env::set_var(API_KEY_VAR, "lm-studio");
    std::env::set_var(TIMEOUT_VAR, "45");

    let config = Config::from_env(ProviderPolicy::Strict).expect("valid environment");
    assert_eq!(config.provider, Some(Provider::ChatCompletion));
    assert_eq!(config.base_url, "http://localhost:1234/v1");
    assert_eq!(config.model, "local-model");
    assert_eq!(config.api_key.as_ref().unwrap().expose_secret(), "lm-studio");
    assert_eq!(config.request_timeout, Duration::from_secs(45));

    std::env::set_var(PROVIDER_VAR, "lmstudio");
    let err = Config::from_env(ProviderPolicy::Strict).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownProvider(ref v) if v == "lmstudio"));

    let config = Config::from_env(ProviderPolicy::AllowUnconfigured).expect("lenient load");
    assert!(config.provider.is_none());

    for var in [PROVIDER_VAR, BASE_URL_VAR, MODEL_VAR, API_KEY_VAR, TIMEOUT_VAR] {
        std::env::remove_var(var);
    }
}
