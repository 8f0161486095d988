//! Embedding generation for semantic search and retrieval.
//!
//! Vectors from different embedders are not comparable. Every embedder reports
//! a `model_id`, and an index remembers the id it was built with.

mod bert;
mod hashing;
mod model_cache;
mod openai;

pub use bert::{LocalBertEmbedder, DEFAULT_LOCAL_DIMENSIONS, DEFAULT_LOCAL_MODEL};
pub use hashing::HashingEmbedder;
pub use model_cache::ModelCache;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingSettings, Settings};
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Prepare the backend, e.g. load a local model.
    ///
    /// Called before indexing, outside the per-call timeout.
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }

    /// Generate embeddings for multiple texts.
    ///
    /// Returns exactly one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VidbriefError::EmbeddingUnavailable("Empty embedding response".to_string()))
    }

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifier of the backend and model producing the vectors.
    fn model_id(&self) -> &str;
}

/// Embedding backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// Remote OpenAI embeddings API.
    OpenAI,
    /// Sentence-transformer model run locally.
    Local,
    /// Lexical feature hashing, no model or network required.
    Hashing,
}

impl EmbeddingProvider {
    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingProvider::OpenAI => "text-embedding-3-small",
            EmbeddingProvider::Local => DEFAULT_LOCAL_MODEL,
            EmbeddingProvider::Hashing => "hashing",
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "local" | "sentence-transformers" => Ok(EmbeddingProvider::Local),
            "hashing" => Ok(EmbeddingProvider::Hashing),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

/// Create an embedder from settings.
pub fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let provider = settings.provider()?;
    let model = settings.model_name()?;

    if settings.dimensions == 0 {
        return Err(VidbriefError::InvalidConfig(
            "embedding.dimensions must be positive".to_string(),
        ));
    }

    let embedder: Arc<dyn Embedder> = match provider {
        EmbeddingProvider::OpenAI => Arc::new(
            OpenAIEmbedder::with_config(&model, settings.dimensions as usize)
                .with_api_base(settings.api_base.clone())
                .with_timeout(Duration::from_secs(settings.timeout_secs)),
        ),
        EmbeddingProvider::Local => {
            let model_dir = settings.model_dir.as_deref().map(Settings::expand_path);
            Arc::new(
                LocalBertEmbedder::new(&model, settings.dimensions as usize)
                    .with_model_dir(model_dir),
            )
        }
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(settings.dimensions as usize)),
    };

    Ok(embedder)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::OpenAI));
        assert_eq!("Hashing".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::Hashing));
        assert_eq!("local".parse::<EmbeddingProvider>(), Ok(EmbeddingProvider::Local));
        assert!("faiss".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_create_embedder() {
        let settings = EmbeddingSettings {
            provider: "hashing".to_string(),
            dimensions: 64,
            ..EmbeddingSettings::default()
        };
        let embedder = create_embedder(&settings).unwrap();
        assert_eq!(embedder.dimensions(), 64);
        assert_eq!(embedder.model_id(), "hashing:64");

        let bad = EmbeddingSettings {
            provider: "word2vec".to_string(),
            ..EmbeddingSettings::default()
        };
        assert!(matches!(create_embedder(&bad), Err(VidbriefError::InvalidConfig(_))));
    }

    #[test]
    fn test_local_is_default_provider() {
        let embedder = create_embedder(&EmbeddingSettings::default()).unwrap();
        assert_eq!(embedder.model_id(), "local:sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(embedder.dimensions(), 384);
    }
}
