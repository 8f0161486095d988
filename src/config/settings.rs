//! Configuration settings for VidBrief.

use crate::chunking::ChunkingConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, VidbriefError};
use crate::generation::GenerationProvider;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
    pub quiz: QuizSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (downloaded captions and audio).
    pub temp_dir: String,
    /// Run the punctuation pass before displaying a transcript.
    pub punctuate: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/vidbrief".to_string(),
            punctuate: true,
        }
    }
}

/// Audio transcription used when a video has no captions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcribe the audio track when no captions are available.
    pub audio_fallback: bool,
    /// Transcription model.
    pub model: String,
    /// OpenAI-compatible endpoint override.
    pub api_base: Option<String>,
    /// Largest audio file sent for transcription, in megabytes.
    pub max_audio_mb: u64,
    /// Timeout for the transcription request, in seconds.
    pub timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            audio_fallback: true,
            model: "whisper-1".to_string(),
            api_base: None,
            max_audio_mb: 25,
            timeout_secs: 300,
        }
    }
}

/// Transcript chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Characters shared by consecutive chunks.
    pub overlap_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        let config = ChunkingConfig::default();
        Self {
            max_chars: config.max_chars,
            overlap_chars: config.overlap_chars,
        }
    }
}

impl ChunkingSettings {
    /// Validated chunker configuration.
    pub fn to_config(&self) -> Result<ChunkingConfig> {
        ChunkingConfig::new(self.max_chars, self.overlap_chars)
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (local, openai, hashing).
    pub provider: String,
    /// Model name. Defaults per provider when unset.
    pub model: Option<String>,
    /// Directory with a local model's files, bypassing the download cache.
    pub model_dir: Option<String>,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// OpenAI-compatible endpoint override.
    pub api_base: Option<String>,
    /// Timeout for a single embedding call, in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model: None,
            model_dir: None,
            dimensions: 384,
            api_base: None,
            timeout_secs: 60,
        }
    }
}

impl EmbeddingSettings {
    /// Parsed provider.
    pub fn provider(&self) -> Result<EmbeddingProvider> {
        self.provider.parse().map_err(VidbriefError::InvalidConfig)
    }

    /// Configured model, or the provider default.
    pub fn model_name(&self) -> Result<String> {
        let provider = self.provider()?;
        Ok(self
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string()))
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Generation provider (openai, anthropic).
    pub provider: String,
    /// Model name. Defaults per provider when unset.
    pub model: Option<String>,
    /// Endpoint override.
    pub api_base: Option<String>,
    /// Timeout for a single generation call, in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            api_base: None,
            timeout_secs: 120,
        }
    }
}

impl GenerationSettings {
    /// Parsed provider.
    pub fn provider(&self) -> Result<GenerationProvider> {
        self.provider.parse().map_err(VidbriefError::InvalidConfig)
    }

    /// Configured model, or the provider default.
    pub fn model_name(&self) -> Result<String> {
        let provider = self.provider()?;
        Ok(self
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string()))
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks placed in the answer context.
    pub top_k: usize,
    /// Minimum similarity for the search command.
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.0,
        }
    }
}

/// Quiz settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizSettings {
    /// Number of questions requested from the model.
    pub num_questions: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self { num_questions: 3 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory containing a `prompts.toml` that overrides the defaults.
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidbriefError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidbrief")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.max_chars, 1000);
        assert_eq!(settings.chunking.overlap_chars, 200);
        assert_eq!(settings.retrieval.top_k, 4);
        assert_eq!(settings.quiz.num_questions, 3);
        assert_eq!(settings.generation.model_name().unwrap(), "gpt-4o-mini");
        assert!(settings.chunking.to_config().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[generation]\nprovider = \"anthropic\"\n\n[chunking]\nmax_chars = 500\n"
        )
        .unwrap();

        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.chunking.max_chars, 500);
        assert_eq!(settings.chunking.overlap_chars, 200);
        assert_eq!(
            settings.generation.model_name().unwrap(),
            "claude-3-haiku-20240307"
        );
        assert_eq!(settings.embedding.provider, "local");
        assert_eq!(
            settings.embedding.model_name().unwrap(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.retrieval.top_k, 4);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.quiz.num_questions = 5;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.quiz.num_questions, 5);
    }

    #[test]
    fn test_invalid_chunking_settings() {
        let settings = ChunkingSettings {
            max_chars: 100,
            overlap_chars: 100,
        };
        assert!(matches!(
            settings.to_config(),
            Err(VidbriefError::InvalidConfig(_))
        ));
    }
}
