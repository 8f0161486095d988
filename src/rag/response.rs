//! Grounded answer generation.

use crate::config::Prompts;
use crate::generation::{generate_within, Generator};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Returned in place of an answer when generation fails.
pub const FALLBACK_ANSWER: &str = "Sorry, couldn't get a response.";

const ANSWER_MAX_TOKENS: u32 = 256;
const ANSWER_TEMPERATURE: f32 = 0.2;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;

/// An answer to a question about the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Answer text, or [`FALLBACK_ANSWER`].
    pub text: String,
    /// 1.0 when the generation call succeeded, 0.0 when it failed.
    ///
    /// This is a success flag, not a calibrated probability.
    pub confidence: f32,
}

impl Answer {
    fn fallback() -> Self {
        Self {
            text: FALLBACK_ANSWER.to_string(),
            confidence: 0.0,
        }
    }

    /// Whether the generation call behind this answer succeeded.
    pub fn is_fallback(&self) -> bool {
        self.confidence == 0.0
    }
}

/// Combines retrieved context with a question into one generation request.
pub struct AnswerSynthesizer {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            prompts: Prompts::default(),
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Answer `question` from `context`.
    ///
    /// Never fails: generation errors and timeouts yield the fallback answer.
    #[instrument(skip(self, context), fields(context_chars = context.len()))]
    pub async fn answer(&self, question: &str, context: &str) -> Answer {
        let prompt = self
            .prompts
            .render_with_custom(&self.prompts.answer, &[("context", context), ("question", question)]);

        match generate_within(
            self.generator.as_ref(),
            &prompt,
            ANSWER_MAX_TOKENS,
            ANSWER_TEMPERATURE,
            self.timeout,
        )
        .await
        {
            Ok(text) => {
                debug!("Answer generated by {}", self.generator.model_id());
                Answer {
                    text: text.trim().to_string(),
                    confidence: 1.0,
                }
            }
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                Answer::fallback()
            }
        }
    }
}
