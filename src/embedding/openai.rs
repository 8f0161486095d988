//! OpenAI embeddings implementation.

use super::Embedder;
use crate::error::{Result, VidbriefError};
use crate::openai::{create_client, DEFAULT_TIMEOUT_SECS};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// OpenAI has a limit on batch size.
const BATCH_SIZE: usize = 100;

/// OpenAI-based embedder.
///
/// The HTTP client is created on first use and reused afterwards.
pub struct OpenAIEmbedder {
    client: OnceCell<Client<OpenAIConfig>>,
    api_base: Option<String>,
    request_timeout: Duration,
    model: String,
    dimensions: usize,
    model_id: String,
}

impl OpenAIEmbedder {
    /// Create a new OpenAI embedder with default settings.
    pub fn new() -> Self {
        Self::with_config("text-embedding-3-small", 1536)
    }

    /// Create a new OpenAI embedder with custom model and dimensions.
    pub fn with_config(model: &str, dimensions: usize) -> Self {
        Self {
            client: OnceCell::new(),
            api_base: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            model: model.to_string(),
            dimensions,
            model_id: format!("openai:{}:{}", model, dimensions),
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
                debug!("Initializing OpenAI embedding client");
                create_client(self.api_base.as_deref(), self.request_timeout)
                    .map_err(|e| VidbriefError::EmbeddingUnavailable(e.to_string()))
            })
            .await
    }
}

impl Default for OpenAIEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.client().await?;
        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(BATCH_SIZE) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(batch.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| {
                    VidbriefError::EmbeddingUnavailable(format!("Failed to build request: {}", e))
                })?;

            let response = client.embeddings().create(request).await.map_err(|e| {
                VidbriefError::EmbeddingUnavailable(format!("Embedding API error: {}", e))
            })?;

            if response.data.len() != batch.len() {
                return Err(VidbriefError::EmbeddingUnavailable(format!(
                    "Embedding API returned {} vectors for {} inputs",
                    response.data.len(),
                    batch.len()
                )));
            }

            // Sort by index to ensure correct order
            let mut embeddings = response.data;
            embeddings.sort_by_key(|e| e.index);
            all_embeddings.extend(embeddings.into_iter().map(|e| e.embedding));
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
