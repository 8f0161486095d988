//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and API keys are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, VidbriefError};
use crate::transcript_source::extract_video_id;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Summarization, punctuation and indexing need both backends.
    Analyze,
    /// Asking questions needs both backends.
    Ask,
    /// Search only embeds.
    Search,
    /// Quiz generation only generates.
    Quiz,
}

impl Operation {
    fn needs_generation(self) -> bool {
        !matches!(self, Operation::Search)
    }

    fn needs_embedding(self) -> bool {
        !matches!(self, Operation::Quiz)
    }
}

/// Run pre-flight checks for the given operation on `input`.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings, input: &str) -> Result<()> {
    if operation.needs_generation() && settings.generation.api_base.is_none() {
        check_api_key(settings.generation.provider()?.api_key_var())?;
    }

    if operation.needs_embedding() && settings.embedding.api_base.is_none() {
        if settings.embedding.provider()? == EmbeddingProvider::OpenAI {
            check_api_key(crate::openai::API_KEY_VAR)?;
        }
    }

    if extract_video_id(input).is_some() {
        check_tool("yt-dlp")?;
    }

    if needs_transcription_key(settings, input) {
        check_api_key(crate::openai::API_KEY_VAR).map_err(|_| {
            VidbriefError::Config(format!(
                "{} is needed to transcribe videos without captions. \
                 Set it, or set transcription.audio_fallback = false.",
                crate::openai::API_KEY_VAR
            ))
        })?;
    }

    Ok(())
}

/// YouTube input may have no captions, in which case the audio is
/// transcribed through the OpenAI API.
fn needs_transcription_key(settings: &Settings, input: &str) -> bool {
    settings.transcription.audio_fallback
        && settings.transcription.api_base.is_none()
        && extract_video_id(input).is_some()
}

/// Check that an API key variable is set and non-empty.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(VidbriefError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(VidbriefError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidbriefError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidbriefError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidbriefError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_search_needs_no_key() {
        let settings = Settings::default();
        assert!(check(Operation::Search, &settings, "notes.txt").is_ok());
    }

    #[test]
    fn test_api_base_skips_key_check() {
        let mut settings = Settings::default();
        settings.generation.api_base = Some("http://localhost:11434/v1".to_string());
        assert!(check(Operation::Quiz, &settings, "notes.txt").is_ok());
    }

    #[test]
    fn test_youtube_input_needs_transcription_key() {
        let mut settings = Settings::default();
        assert!(needs_transcription_key(&settings, "https://youtu.be/dQw4w9WgXcQ"));
        assert!(!needs_transcription_key(&settings, "notes.txt"));

        settings.transcription.api_base = Some("http://localhost:8000/v1".to_string());
        assert!(!needs_transcription_key(&settings, "dQw4w9WgXcQ"));

        settings.transcription.api_base = None;
        settings.transcription.audio_fallback = false;
        assert!(!needs_transcription_key(&settings, "dQw4w9WgXcQ"));
    }

    #[test]
    fn test_missing_key_var() {
        assert!(matches!(
            check_api_key("VIDBRIEF_TEST_KEY_THAT_IS_NEVER_SET"),
            Err(VidbriefError::Config(_))
        ));
    }
}
