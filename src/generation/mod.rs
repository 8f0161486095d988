//! Text generation backends.
//!
//! Every backend answers `generate(prompt, max_tokens, temperature)` with a
//! plain `String`. Response-shape differences between providers are resolved
//! inside the adapters.

mod anthropic;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAIGenerator;

use crate::config::GenerationSettings;
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Trait for text generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn generate(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;

    /// Identifier of the backend and model.
    fn model_id(&self) -> &str;
}

/// Generation backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    OpenAI,
    Anthropic,
}

impl GenerationProvider {
    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            GenerationProvider::OpenAI => "gpt-4o-mini",
            GenerationProvider::Anthropic => "claude-3-haiku-20240307",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            GenerationProvider::OpenAI => crate::openai::API_KEY_VAR,
            GenerationProvider::Anthropic => anthropic::API_KEY_VAR,
        }
    }
}

impl std::str::FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(GenerationProvider::OpenAI),
            "anthropic" | "claude" => Ok(GenerationProvider::Anthropic),
            _ => Err(format!("Unknown generation provider: {}", s)),
        }
    }
}

/// Create a generator from settings.
pub fn create_generator(settings: &GenerationSettings) -> Result<Arc<dyn Generator>> {
    let provider = settings.provider()?;
    let model = settings.model_name()?;

    let timeout = Duration::from_secs(settings.timeout_secs);

    let generator: Arc<dyn Generator> = match provider {
        GenerationProvider::OpenAI => Arc::new(
            OpenAIGenerator::new(&model)
                .with_api_base(settings.api_base.clone())
                .with_timeout(timeout),
        ),
        GenerationProvider::Anthropic => Arc::new(
            AnthropicGenerator::new(&model)
                .with_api_base(settings.api_base.clone())
                .with_timeout(timeout),
        ),
    };

    Ok(generator)
}

/// Run one generation call bounded by `timeout`.
///
/// Blank output counts as a failure.
pub async fn generate_within(
    generator: &dyn Generator,
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
) -> Result<String> {
    let text = match tokio::time::timeout(timeout, generator.generate(prompt, max_tokens, temperature)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!("Generation with {} timed out", generator.model_id());
            return Err(VidbriefError::GenerationTimeout(timeout.as_secs()));
        }
    };

    if text.trim().is_empty() {
        return Err(VidbriefError::GenerationFailure(
            "Empty response from model".to_string(),
        ));
    }

    Ok(text)
}

/// Test doubles shared by unit tests across the crate.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed reply and records every prompt.
    pub struct FixedGenerator {
        reply: String,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FixedGenerator {
        pub fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(&self, prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    /// Always fails.
    pub struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
            Err(VidbriefError::GenerationFailure("backend unreachable".to_string()))
        }

        fn model_id(&self) -> &str {
            "failing"
        }
    }

    /// Never answers within any reasonable timeout.
    pub struct StalledGenerator;

    #[async_trait]
    impl Generator for StalledGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }

        fn model_id(&self) -> &str {
            "stalled"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<GenerationProvider>(), Ok(GenerationProvider::OpenAI));
        assert_eq!("Claude".parse::<GenerationProvider>(), Ok(GenerationProvider::Anthropic));
        assert!("bard".parse::<GenerationProvider>().is_err());
    }

    #[test]
    fn test_create_generator_uses_default_model() {
        let settings = GenerationSettings {
            provider: "anthropic".to_string(),
            model: None,
            ..GenerationSettings::default()
        };
        let generator = create_generator(&settings).unwrap();
        assert_eq!(generator.model_id(), "anthropic:claude-3-haiku-20240307");
    }

    #[test]
    fn test_generate_within_passes_through() {
        let generator = FixedGenerator::new("hello");
        let text = tokio_test::block_on(generate_within(
            &generator,
            "prompt",
            10,
            0.0,
            Duration::from_secs(5),
        ))
        .unwrap();
        assert_eq!(text, "hello");
        assert_eq!(generator.last_prompt().as_deref(), Some("prompt"));
    }

    #[tokio::test]
    async fn test_generate_within_rejects_blank_output() {
        let generator = FixedGenerator::new("   \n");
        let result = generate_within(&generator, "p", 10, 0.0, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(VidbriefError::GenerationFailure(_))));
    }

    #[tokio::test]
    async fn test_generate_within_times_out() {
        let result =
            generate_within(&StalledGenerator, "p", 10, 0.0, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(VidbriefError::GenerationTimeout(_))));
    }
}
