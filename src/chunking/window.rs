//! Sliding-window chunking implementation.
//!
//! The window is `max_chars` long. Inside each window the chunk ends at the
//! last paragraph break, else the last line break, else the last whitespace,
//! provided that boundary lies past `start + max(overlap + 1, max_chars / 2)`.
//! Otherwise the window is cut at exactly `max_chars`. The next window starts
//! `overlap_chars` before the previous end, moved forward to the first word
//! start inside the overlap when there is one.

use super::{Chunk, ChunkingConfig};
use crate::error::Result;
use tracing::debug;

/// Preferred split points, strongest first.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Paragraph,
    Line,
    Whitespace,
}

impl Boundary {
    const ORDER: [Boundary; 3] = [Boundary::Paragraph, Boundary::Line, Boundary::Whitespace];

    /// Whether a chunk may end right before `pos`.
    fn matches(self, chars: &[char], pos: usize) -> bool {
        match self {
            Boundary::Paragraph => pos >= 2 && chars[pos - 1] == '\n' && chars[pos - 2] == '\n',
            Boundary::Line => pos >= 1 && chars[pos - 1] == '\n',
            Boundary::Whitespace => pos >= 1 && chars[pos - 1].is_whitespace(),
        }
    }
}

/// Deterministic sliding-window chunker.
#[derive(Debug, Clone)]
pub struct SlidingWindowChunker {
    config: ChunkingConfig,
}

impl SlidingWindowChunker {
    /// Create a chunker, validating the configuration.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split text into chunks. Empty text yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let byte_offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0;
        loop {
            let hard_end = (start + self.config.max_chars).min(total);
            let end = if hard_end == total {
                total
            } else {
                self.split_point(&chars, start, hard_end)
            };

            chunks.push(Chunk {
                id: chunks.len(),
                text: text[byte_offsets[start]..byte_offsets[end]].to_string(),
                start_offset: start,
                end_offset: end,
            });

            if end == total {
                break;
            }
            start = self.next_start(&chars, end);
        }

        debug!(
            "Split {} characters into {} chunks (max={}, overlap={})",
            total,
            chunks.len(),
            self.config.max_chars,
            self.config.overlap_chars
        );
        chunks
    }

    /// Pick where the chunk starting at `start` ends.
    fn split_point(&self, chars: &[char], start: usize, hard_end: usize) -> usize {
        let min_end = start + (self.config.overlap_chars + 1).max(self.config.max_chars / 2);

        for boundary in Boundary::ORDER {
            if let Some(pos) = (min_end..=hard_end)
                .rev()
                .find(|&pos| boundary.matches(chars, pos))
            {
                return pos;
            }
        }

        hard_end
    }

    /// Start of the next window: inside `[end - overlap, end)`, at a word start if possible.
    fn next_start(&self, chars: &[char], end: usize) -> usize {
        let lo = end - self.config.overlap_chars;
        (lo..end)
            .find(|&pos| {
                !chars[pos].is_whitespace() && (pos == 0 || chars[pos - 1].is_whitespace())
            })
            .unwrap_or(lo)
    }
}
