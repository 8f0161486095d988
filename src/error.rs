//! Error types for VidBrief.

use thiserror::Error;

/// Library-level error type for VidBrief operations.
#[derive(Error, Debug)]
pub enum VidbriefError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding backend unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Embedding call timed out after {0}s")]
    EmbeddingTimeout(u64),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Generation call timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Transcript source error: {0}")]
    TranscriptSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

/// Result type alias for VidBrief operations.
pub type Result<T> = std::result::Result<T, VidbriefError>;
