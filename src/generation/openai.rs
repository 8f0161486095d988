//! OpenAI chat-completions generator.

use super::Generator;
use crate::error::{Result, VidbriefError};
use crate::openai::{create_client, DEFAULT_TIMEOUT_SECS};
use async_openai::config::OpenAIConfig;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// Generator backed by the OpenAI chat completions API.
pub struct OpenAIGenerator {
    client: OnceCell<Client<OpenAIConfig>>,
    api_base: Option<String>,
    request_timeout: Duration,
    model: String,
    model_id: String,
}

impl OpenAIGenerator {
    pub fn new(model: &str) -> Self {
        Self {
            client: OnceCell::new(),
            api_base: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            model: model.to_string(),
            model_id: format!("openai:{}", model),
        }
    }

    /// Use an OpenAI-compatible endpoint instead of the public API.
    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        self.api_base = api_base;
        self
    }

    /// Set the HTTP request timeout used when the client is created.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    async fn client(&self) -> Result<&Client<OpenAIConfig>> {
        self.client
            .get_or_try_init(|| async {
                debug!("Initializing OpenAI chat client");
                create_client(self.api_base.as_deref(), self.request_timeout)
                    .map_err(|e| VidbriefError::GenerationFailure(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let client = self.client().await?;

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| VidbriefError::GenerationFailure(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .max_completion_tokens(max_tokens)
            .temperature(temperature)
            .build()
            .map_err(|e| VidbriefError::GenerationFailure(e.to_string()))?;

        let response = client.chat().create(request).await.map_err(|e| {
            VidbriefError::GenerationFailure(format!("Failed to generate response: {}", e))
        })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| VidbriefError::GenerationFailure("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", text.len());
        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
