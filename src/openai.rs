//! OpenAI-compatible client configuration with sensible defaults.
//!
//! Both the OpenAI and Groq endpoints speak the same protocol, so one client
//! type serves every provider; only the base URL and key differ.

use crate::config::ProviderSettings;
use crate::error::{Result, TutorError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Read an API key from the named environment variable.
pub fn api_key_from_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(TutorError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Create a client for the given provider, reading its key from the environment.
pub fn create_client(provider: &ProviderSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = api_key_from_env(&provider.api_key_env)?;
    let timeout = match provider.timeout_secs {
        0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        secs => Duration::from_secs(secs),
    };
    create_client_with_timeout(&provider.api_base, &api_key, timeout)
}

/// Create a client with an explicit base URL, key and timeout.
pub fn create_client_with_timeout(
    api_base: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(api_base)
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = api_key_from_env("TUTORLY_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));
        assert!(err.to_string().contains("TUTORLY_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_client_with_explicit_key() {
        let client = create_client_with_timeout(
            "https://api.groq.com/openai/v1",
            "test-key",
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }
}
