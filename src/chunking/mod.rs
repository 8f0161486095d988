//! Transcript chunking for embedding and retrieval.
//!
//! Splits a plain-text transcript into overlapping, size-bounded segments.

mod window;

pub use window::SlidingWindowChunker;

use crate::error::{Result, VidbriefError};
use serde::{Deserialize, Serialize};

/// A contiguous segment of a transcript.
///
/// Offsets are measured in characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequence position, unique within one index build.
    pub id: usize,
    /// Text content of this chunk. Never empty.
    pub text: String,
    /// Start position in the original transcript.
    pub start_offset: usize,
    /// End position in the original transcript (exclusive).
    pub end_offset: usize,
}

impl Chunk {
    /// Length of this chunk in characters.
    pub fn char_len(&self) -> usize {
        self.end_offset - self.start_offset
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters. Hard cap.
    pub max_chars: usize,
    /// Characters shared between consecutive chunks.
    pub overlap_chars: usize,
}

impl ChunkingConfig {
    /// Create a validated chunking configuration.
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self> {
        let config = Self {
            max_chars,
            overlap_chars,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that sizes are positive and the overlap fits inside a chunk.
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 || self.overlap_chars == 0 {
            return Err(VidbriefError::InvalidConfig(format!(
                "chunk size and overlap must be positive (got max={}, overlap={})",
                self.max_chars, self.overlap_chars
            )));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(VidbriefError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk size ({})",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 200,
        }
    }
}

/// Split `text` into overlapping chunks of at most `max_chars` characters.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Result<Vec<Chunk>> {
    let config = ChunkingConfig::new(max_chars, overlap_chars)?;
    Ok(SlidingWindowChunker::new(config)?.chunk(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(ChunkingConfig::new(100, 20).is_ok());
        assert!(matches!(
            ChunkingConfig::new(100, 100),
            Err(VidbriefError::InvalidConfig(_))
        ));
        assert!(matches!(
            ChunkingConfig::new(100, 150),
            Err(VidbriefError::InvalidConfig(_))
        ));
        assert!(matches!(
            ChunkingConfig::new(0, 0),
            Err(VidbriefError::InvalidConfig(_))
        ));
        assert!(matches!(
            ChunkingConfig::new(100, 0),
            Err(VidbriefError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_chunk_text_rejects_bad_config() {
        assert!(chunk_text("hello", 10, 10).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ChunkingConfig::default().validate().is_ok());
    }
}
