//! Local feature-hashing embedder.
//!
//! Lowercased alphanumeric tokens are hashed into a fixed number of buckets
//! and the resulting term-count vector is L2-normalized. Lexical only, so it
//! is used only when `embedding.provider = "hashing"` is set explicitly, for
//! offline runs and tests.

use super::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Default dimensionality, matching common small sentence encoders.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Feature-hashing embedder.
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("hashing:{}", dimensions),
        }
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];

        for token in tokenize(text) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

/// Split text into lowercase alphanumeric tokens.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::cosine_similarity;

    #[test]
    fn test_tokenize() {
        let tokens: Vec<String> = tokenize("What color is the SKY? It's blue!").collect();
        assert_eq!(tokens, vec!["what", "color", "is", "the", "sky", "it", "s", "blue"]);
    }

    #[test]
    fn test_embedding_is_normalized_and_deterministic() {
        let embedder = HashingEmbedder::new(128);
        let a = embedder.embed_text("The quick brown fox");
        let b = embedder.embed_text("the QUICK brown fox!");

        assert_eq!(a.len(), 128);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_gives_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        assert!(embedder.embed_text("  ...  ").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::new(4096);
        let query = embedder.embed_text("how hot does water boil");
        let related = embedder.embed_text("water starts to boil when it is hot enough");
        let unrelated = embedder.embed_text("penguins waddle across antarctic ice sheets");

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch_preserves_cardinality_and_order() {
        let embedder = HashingEmbedder::new(64);
        let texts = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let vectors = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        for (text, vector) in texts.iter().zip(&vectors) {
            assert_eq!(vector, &embedder.embed_text(text));
        }
    }
}
