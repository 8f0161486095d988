//! Local sentence-transformer embeddings using candle.
//!
//! Runs a BERT encoder (all-MiniLM-L6-v2 by default) on the CPU:
//! 1. Tokenize with batch-longest padding, truncated to 256 tokens
//! 2. BERT forward pass
//! 3. Mean pooling weighted by the attention mask
//! 4. L2 normalization
//!
//! Model files come from a configured directory, or are downloaded into the
//! model cache on first use.

use super::model_cache::{verify_model_dir, ModelCache};
use super::Embedder;
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

/// Hugging Face repository of the default local model.
pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output size of the default local model.
pub const DEFAULT_LOCAL_DIMENSIONS: usize = 384;

/// Inputs longer than this many tokens are truncated.
const MAX_SEQ_LENGTH: usize = 256;

const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl LoadedModel {
    fn load(dir: &Path, expected_dimensions: usize) -> Result<Self> {
        let device = Device::Cpu;

        let raw_config: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("config.json"))?)?;
        let hidden_size = raw_config["hidden_size"].as_u64().unwrap_or(0) as usize;
        if hidden_size != expected_dimensions {
            return Err(VidbriefError::DimensionMismatch(format!(
                "model in {} produces {} dimensions, expected {}",
                dir.display(),
                hidden_size,
                expected_dimensions
            )));
        }
        let config: Config = serde_json::from_value(raw_config)?;

        let mut tokenizer = Tokenizer::from_file(dir.join("tokenizer.json")).map_err(|e| {
            VidbriefError::EmbeddingUnavailable(format!("Failed to load tokenizer: {}", e))
        })?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LENGTH,
                ..Default::default()
            }))
            .map_err(|e| {
                VidbriefError::EmbeddingUnavailable(format!("Failed to configure tokenizer: {}", e))
            })?;

        // SAFETY: the weights file is only read, and nothing rewrites it while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[dir.join("model.safetensors")], DType::F32, &device)
        }
        .map_err(candle_error)?;
        let model = BertModel::load(vb, &config).map_err(candle_error)?;

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| VidbriefError::EmbeddingUnavailable(format!("Tokenization failed: {}", e)))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let ids: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_ids().iter().copied())
            .collect();
        let mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().iter().copied())
            .collect();

        let run = || -> candle_core::Result<Vec<Vec<f32>>> {
            let input_ids = Tensor::from_vec(ids, (batch, seq_len), &self.device)?;
            let attention_mask = Tensor::from_vec(mask, (batch, seq_len), &self.device)?;
            let token_type_ids = input_ids.zeros_like()?;

            let hidden = self
                .model
                .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
            mean_pool_normalized(&hidden, &attention_mask)?.to_vec2::<f32>()
        };

        run().map_err(candle_error)
    }
}

/// Average token embeddings over unmasked positions, then scale to unit length.
///
/// `hidden` is `(batch, seq, hidden)` and `mask` is `(batch, seq)`.
fn mean_pool_normalized(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = mask.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9f32, f32::MAX)?;
    let mean = summed.broadcast_div(&counts)?;

    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12f32, f32::MAX)?;
    mean.broadcast_div(&norm)
}

fn candle_error(e: candle_core::Error) -> VidbriefError {
    VidbriefError::EmbeddingUnavailable(format!("Model inference failed: {}", e))
}

/// Sentence-transformer embedder running locally.
///
/// The model is loaded once, on first use, and shared by later calls.
pub struct LocalBertEmbedder {
    model: OnceCell<Arc<LoadedModel>>,
    repo_id: String,
    model_dir: Option<PathBuf>,
    dimensions: usize,
    model_id: String,
}

impl LocalBertEmbedder {
    pub fn new(repo_id: &str, dimensions: usize) -> Self {
        Self {
            model: OnceCell::new(),
            repo_id: repo_id.to_string(),
            model_dir: None,
            dimensions,
            model_id: format!("local:{}", repo_id),
        }
    }

    /// Load model files from `dir` instead of the download cache.
    pub fn with_model_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.model_dir = dir;
        self
    }

    async fn model(&self) -> Result<Arc<LoadedModel>> {
        self.model
            .get_or_try_init(|| async {
                let dir = match &self.model_dir {
                    Some(dir) => {
                        verify_model_dir(dir)?;
                        dir.clone()
                    }
                    None => {
                        ModelCache::new(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))?
                            .fetch(&self.repo_id)
                            .await?
                    }
                };

                info!("Loading embedding model {} from {}", self.repo_id, dir.display());
                let dimensions = self.dimensions;
                let loaded = tokio::task::spawn_blocking(move || LoadedModel::load(&dir, dimensions))
                    .await
                    .map_err(|e| {
                        VidbriefError::EmbeddingUnavailable(format!("Model loading task failed: {}", e))
                    })??;
                Ok::<_, VidbriefError>(Arc::new(loaded))
            })
            .await
            .map(Arc::clone)
            .map_err(|e| match e {
                VidbriefError::EmbeddingUnavailable(_) | VidbriefError::DimensionMismatch(_) => e,
                other => VidbriefError::EmbeddingUnavailable(format!(
                    "Failed to load {}: {}",
                    self.repo_id, other
                )),
            })
    }
}

impl Default for LocalBertEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_MODEL, DEFAULT_LOCAL_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for LocalBertEmbedder {
    async fn warm_up(&self) -> Result<()> {
        self.model().await.map(|_| ())
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let texts = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || model.embed(&texts))
            .await
            .map_err(|e| {
                VidbriefError::EmbeddingUnavailable(format!("Embedding task failed: {}", e))
            })??;

        debug!("Embedded {} texts locally", vectors.len());
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
