//! Index construction and context retrieval for RAG.

use crate::chunking::{ChunkingConfig, SlidingWindowChunker};
use crate::embedding::Embedder;
use crate::error::{Result, VidbriefError};
use crate::vector_store::{SearchHit, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Number of chunks retrieved when the caller has no preference.
pub const DEFAULT_TOP_K: usize = 4;

/// Placed between chunk texts in an assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 60;

/// Builds indexes from transcripts and retrieves context for queries.
///
/// The same embedder serves both directions; an index built by one retriever
/// can only be queried through a retriever with the same embedder model.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    chunker: SlidingWindowChunker,
    timeout: Duration,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<dyn Embedder>, chunking: ChunkingConfig) -> Result<Self> {
        Ok(Self {
            embedder,
            chunker: SlidingWindowChunker::new(chunking)?,
            timeout: Duration::from_secs(DEFAULT_EMBEDDING_TIMEOUT_SECS),
        })
    }

    /// Set the timeout applied to each embedding call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Chunk, embed and index a transcript.
    #[instrument(skip(self, transcript), fields(chars = transcript.chars().count()))]
    pub async fn index_transcript(&self, transcript: &str) -> Result<VectorIndex> {
        if transcript.trim().is_empty() {
            return Err(VidbriefError::InvalidArgument(
                "transcript is empty".to_string(),
            ));
        }

        let chunks = self.chunker.chunk(transcript);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        self.embedder.warm_up().await?;
        let vectors = self.embed_bounded(&texts).await?;
        let index = VectorIndex::build(chunks, vectors, self.embedder.model_id())?;

        info!(
            "Indexed transcript into {} chunks with {}",
            index.len(),
            self.embedder.model_id()
        );
        Ok(index)
    }

    /// Retrieve the `k` chunks most similar to `query`.
    #[instrument(skip(self, index))]
    pub async fn retrieve(&self, index: &VectorIndex, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        self.retrieve_with_threshold(index, query, k, f32::NEG_INFINITY)
            .await
    }

    /// Like [`retrieve`](Self::retrieve), dropping hits scored below `min_score`.
    pub async fn retrieve_with_threshold(
        &self,
        index: &VectorIndex,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(VidbriefError::InvalidArgument("query is empty".to_string()));
        }
        if k == 0 {
            return Err(VidbriefError::InvalidArgument(
                "k must be positive".to_string(),
            ));
        }
        if index.model_id() != self.embedder.model_id() {
            return Err(VidbriefError::InvalidArgument(format!(
                "index was built with {} but queries use {}",
                index.model_id(),
                self.embedder.model_id()
            )));
        }

        let query_vector = self
            .embed_bounded(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                VidbriefError::EmbeddingUnavailable("Empty embedding response".to_string())
            })?;

        let hits = index.search_with_threshold(&query_vector, k, min_score)?;
        debug!("Retrieved {} chunks", hits.len());
        Ok(hits)
    }

    /// Retrieve and join the top `k` chunk texts into one context string.
    pub async fn get_context(&self, index: &VectorIndex, query: &str, k: usize) -> Result<String> {
        let hits = self.retrieve(index, query, k).await?;
        Ok(format_context(&hits))
    }

    async fn embed_bounded(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match tokio::time::timeout(self.timeout, self.embedder.embed_batch(texts)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Embedding with {} timed out", self.embedder.model_id());
                Err(VidbriefError::EmbeddingTimeout(self.timeout.as_secs()))
            }
        }
    }
}

/// Join hit texts in rank order with a visible separator.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::{
        KeywordEmbedder, ShortEmbedder, StalledEmbedder, UnavailableEmbedder,
    };
    use crate::embedding::HashingEmbedder;

    const VOCAB: &[&str] = &["rust", "python", "memory", "garbage", "borrow", "snake"];

    fn retriever(embedder: Arc<dyn Embedder>, max: usize, overlap: usize) -> Retriever {
        Retriever::new(embedder, ChunkingConfig::new(max, overlap).unwrap()).unwrap()
    }

    fn transcript() -> String {
        [
            "Rust manages memory with the borrow checker and ownership. ",
            "Python relies on a garbage collector for memory instead. ",
            "A python is also a large snake found in tropical regions. ",
            "Rust code that fights the borrow checker usually needs a redesign. ",
        ]
        .concat()
    }

    #[tokio::test]
    async fn test_index_transcript() {
        let r = retriever(Arc::new(KeywordEmbedder::new(VOCAB)), 70, 15);
        let index = r.index_transcript(&transcript()).await.unwrap();

        assert!(index.len() >= 4);
        assert_eq!(index.model_id(), "keyword");
        assert_eq!(index.dimensions(), VOCAB.len());
    }

    #[tokio::test]
    async fn test_blank_transcript_rejected() {
        let r = retriever(Arc::new(KeywordEmbedder::new(VOCAB)), 70, 15);
        assert!(matches!(
            r.index_transcript("  \n ").await,
            Err(VidbriefError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable_embedder_is_fatal() {
        let r = retriever(Arc::new(UnavailableEmbedder), 70, 15);
        assert!(matches!(
            r.index_transcript(&transcript()).await,
            Err(VidbriefError::EmbeddingUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_embedding_timeout() {
        let r = retriever(Arc::new(StalledEmbedder), 70, 15).with_timeout(Duration::from_millis(20));
        assert!(matches!(
            r.index_transcript(&transcript()).await,
            Err(VidbriefError::EmbeddingTimeout(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_vectors_detected() {
        let r = retriever(Arc::new(ShortEmbedder), 70, 15);
        assert!(matches!(
            r.index_transcript(&transcript()).await,
            Err(VidbriefError::DimensionMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_query_skips_embedding() {
        let embedder = Arc::new(KeywordEmbedder::new(VOCAB));
        let r = retriever(embedder.clone(), 70, 15);
        let index = r.index_transcript(&transcript()).await.unwrap();
        let calls_after_build = embedder.call_count();

        let result = r.get_context(&index, "   ", DEFAULT_TOP_K).await;
        assert!(matches!(result, Err(VidbriefError::InvalidArgument(_))));
        assert_eq!(embedder.call_count(), calls_after_build);
    }

    #[tokio::test]
    async fn test_context_contains_hits_in_order_once() {
        let r = retriever(Arc::new(KeywordEmbedder::new(VOCAB)), 70, 15);
        let index = r.index_transcript(&transcript()).await.unwrap();

        let query = "How does rust handle memory with the borrow checker?";
        let hits = r.retrieve(&index, query, 3).await.unwrap();
        let context = r.get_context(&index, query, 3).await.unwrap();

        assert_eq!(hits.len(), 3);
        let mut cursor = 0;
        for hit in &hits {
            assert_eq!(context.matches(hit.chunk.text.as_str()).count(), 1);
            let pos = context[cursor..].find(hit.chunk.text.as_str()).unwrap() + cursor;
            cursor = pos + hit.chunk.text.len();
        }
        assert_eq!(context.matches(CONTEXT_SEPARATOR).count(), 2);
        assert!(hits[0].chunk.text.to_lowercase().contains("borrow"));
    }

    #[tokio::test]
    async fn test_mixed_embedders_rejected() {
        let builder = retriever(Arc::new(HashingEmbedder::new(32)), 70, 15);
        let index = builder.index_transcript(&transcript()).await.unwrap();

        let other = retriever(Arc::new(HashingEmbedder::new(64)), 70, 15);
        assert!(matches!(
            other.get_context(&index, "rust", 2).await,
            Err(VidbriefError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_format_context_empty() {
        assert_eq!(format_context(&[]), "");
    }
}
