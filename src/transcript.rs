//! Transcript cleanup and summarization.
//!
//! Both operations absorb generation failures: punctuation falls back to the
//! raw transcript and summarization to a fixed notice.

use crate::config::Prompts;
use crate::generation::{generate_within, Generator};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Shown in place of a summary when generation fails.
pub const SUMMARY_UNAVAILABLE: &str = "Summary not available due to an error.";

const PUNCTUATE_MAX_TOKENS: u32 = 4000;
const PUNCTUATE_TEMPERATURE: f32 = 0.2;
const SUMMARY_MAX_TOKENS: u32 = 300;
const SUMMARY_TEMPERATURE: f32 = 0.3;

/// A transcript summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub text: String,
    /// False when `text` is the fallback notice.
    pub available: bool,
}

impl Summary {
    fn unavailable() -> Self {
        Self {
            text: SUMMARY_UNAVAILABLE.to_string(),
            available: false,
        }
    }
}

/// Prompted generation over a whole transcript.
pub struct TranscriptTools {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    timeout: Duration,
}

impl TranscriptTools {
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts, timeout: Duration) -> Self {
        Self {
            generator,
            prompts,
            timeout,
        }
    }

    /// Add punctuation and capitalization, keeping the words.
    ///
    /// Returns `transcript` unchanged if generation fails.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn punctuate(&self, transcript: &str) -> String {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.punctuate, &[("transcript", transcript)]);

        match generate_within(
            self.generator.as_ref(),
            &prompt,
            PUNCTUATE_MAX_TOKENS,
            PUNCTUATE_TEMPERATURE,
            self.timeout,
        )
        .await
        {
            Ok(text) => {
                info!("Punctuated transcript with {}", self.generator.model_id());
                collapse_newlines(&text)
            }
            Err(e) => {
                warn!("Punctuation failed, keeping raw transcript: {}", e);
                transcript.to_string()
            }
        }
    }

    /// Condense the transcript.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn summarize(&self, transcript: &str) -> Summary {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary, &[("transcript", transcript)]);

        match generate_within(
            self.generator.as_ref(),
            &prompt,
            SUMMARY_MAX_TOKENS,
            SUMMARY_TEMPERATURE,
            self.timeout,
        )
        .await
        {
            Ok(text) => Summary {
                text: text.trim().to_string(),
                available: true,
            },
            Err(e) => {
                warn!("Summarization failed: {}", e);
                Summary::unavailable()
            }
        }
    }
}

fn collapse_newlines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::{FailingGenerator, FixedGenerator, StalledGenerator};

    fn tools(generator: Arc<dyn Generator>) -> TranscriptTools {
        TranscriptTools::new(generator, Prompts::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_punctuate_joins_lines() {
        let generator = Arc::new(FixedGenerator::new("Hello there.\n\nGeneral Kenobi.\n"));
        let out = tools(generator.clone()).punctuate("hello there general kenobi").await;

        assert_eq!(out, "Hello there. General Kenobi.");
        assert!(generator
            .last_prompt()
            .unwrap()
            .contains("hello there general kenobi"));
    }

    #[tokio::test]
    async fn test_punctuate_falls_back_to_raw() {
        let out = tools(Arc::new(FailingGenerator)).punctuate("raw words here").await;
        assert_eq!(out, "raw words here");
    }

    #[tokio::test]
    async fn test_summarize() {
        let summary = tools(Arc::new(FixedGenerator::new(" A short video about water. ")))
            .summarize("long transcript")
            .await;
        assert_eq!(summary.text, "A short video about water.");
        assert!(summary.available);
    }

    #[tokio::test]
    async fn test_summarize_fallback() {
        let summary = tools(Arc::new(FailingGenerator)).summarize("t").await;
        assert_eq!(summary.text, SUMMARY_UNAVAILABLE);
        assert!(!summary.available);

        let timed_out = TranscriptTools::new(
            Arc::new(StalledGenerator),
            Prompts::default(),
            Duration::from_millis(20),
        )
        .summarize("t")
        .await;
        assert!(!timed_out.available);
    }
}
