//! OpenAI client configuration with sensible defaults.

use crate::error::{Result, VidbriefError};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Create an OpenAI client with a custom timeout.
///
/// A custom `api_base` points the client at an OpenAI-compatible server, in
/// which case the API key may be absent.
pub fn create_client(api_base: Option<&str>, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());

    let mut config = OpenAIConfig::new();
    match (api_key, api_base) {
        (Some(key), _) => config = config.with_api_key(key),
        (None, Some(_)) => {}
        (None, None) => {
            return Err(VidbriefError::Config(format!(
                "{} not set. Set it with: export {}='sk-...'",
                API_KEY_VAR, API_KEY_VAR
            )))
        }
    }
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }

    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
