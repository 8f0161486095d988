//! Anthropic Messages API generator.
//!
//! The `content` field of a reply is normally a list of typed blocks, but
//! some gateways return a bare string. Both shapes collapse to one `String`.

use super::Generator;
use crate::error::{Result, VidbriefError};
use crate::openai::DEFAULT_TIMEOUT_SECS;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "ANTHROPIC_API_KEY";

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Longest error body quoted back in a failure message.
const ERROR_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: MessageContent,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Blocks(Vec<ContentBlock>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessageContent {
    /// Join text blocks with newlines, ignoring non-text blocks.
    fn into_text(self) -> String {
        match self {
            MessageContent::Text(text) => text,
            MessageContent::Blocks(blocks) => blocks
                .into_iter()
                .filter(|b| b.kind == "text")
                .filter_map(|b| b.text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

struct ApiClient {
    http: reqwest::Client,
    api_key: String,
}

/// Generator backed by the Anthropic Messages API.
pub struct AnthropicGenerator {
    client: OnceCell<ApiClient>,
    api_base: String,
    request_timeout: Duration,
    model: String,
    model_id: String,
}

impl AnthropicGenerator {
    pub fn new(model: &str) -> Self {
        Self {
            client: OnceCell::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            model: model.to_string(),
            model_id: format!("anthropic:{}", model),
        }
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base.trim_end_matches('/').to_string();
        }
        self
    }

    /// Set the HTTP request timeout used when the client is created.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn client(&self) -> Result<&ApiClient> {
        self.client
            .get_or_try_init(|| async {
                debug!("Initializing Anthropic client");
                let api_key = std::env::var(API_KEY_VAR)
                    .ok()
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| {
                        VidbriefError::GenerationFailure(format!("{} not set", API_KEY_VAR))
                    })?;
                let http = reqwest::Client::builder()
                    .timeout(self.request_timeout)
                    .build()
                    .map_err(|e| VidbriefError::GenerationFailure(e.to_string()))?;
                Ok::<_, VidbriefError>(ApiClient { http, api_key })
            })
            .await
    }
}

#[async_trait]
impl Generator for AnthropicGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let client = self.client().await?;

        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = client
            .http
            .post(format!("{}/v1/messages", self.api_base))
            .header("x-api-key", &client.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| VidbriefError::GenerationFailure(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_EXCERPT_CHARS).collect();
            return Err(VidbriefError::GenerationFailure(format!(
                "HTTP {}: {}",
                status, excerpt
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| VidbriefError::GenerationFailure(format!("Malformed response: {}", e)))?;

        Ok(parsed.content.into_text())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_of(json: &str) -> String {
        serde_json::from_str::<MessagesResponse>(json)
            .unwrap()
            .content
            .into_text()
    }

    #[test]
    fn test_block_list_is_joined() {
        let json = r#"{"id":"msg_1","content":[
            {"type":"text","text":"First part."},
            {"type":"tool_use","id":"t1","name":"noop","input":{}},
            {"type":"text","text":"Second part."}
        ]}"#;
        assert_eq!(content_of(json), "First part.\nSecond part.");
    }

    #[test]
    fn test_plain_string_content() {
        assert_eq!(content_of(r#"{"content":"Just text"}"#), "Just text");
    }

    #[test]
    fn test_empty_block_list() {
        assert_eq!(content_of(r#"{"content":[]}"#), "");
    }

    #[test]
    fn test_request_serialization() {
        let body = MessagesRequest {
            model: "claude-3-haiku-20240307",
            max_tokens: 256,
            temperature: 0.2,
            messages: [RequestMessage {
                role: "user",
                content: "hi",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["max_tokens"], 256);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_api_base_override() {
        let generator = AnthropicGenerator::new("m").with_api_base(Some("http://localhost:8080/".into()));
        assert_eq!(generator.api_base, "http://localhost:8080");
        assert_eq!(generator.model_id(), "anthropic:m");
    }

    #[test]
    fn test_request_timeout() {
        let generator = AnthropicGenerator::new("m");
        assert_eq!(generator.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let generator = generator.with_timeout(Duration::from_secs(30));
        assert_eq!(generator.request_timeout, Duration::from_secs(30));
    }
}
