//! Transcript source abstraction for VidBrief.
//!
//! Every source turns user input (a URL, a video ID, a path) into one plain
//! text transcript. Timestamps and speaker tags are not kept.

mod captions;
mod local;
mod whisper;
mod youtube;

pub use captions::captions_to_text;
pub use local::LocalSource;
pub use whisper::WhisperTranscriber;
pub use youtube::{extract_video_id, YoutubeSource};

use crate::config::Settings;
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Type of transcript source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    YouTube,
    Local,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::YouTube => write!(f, "youtube"),
            SourceType::Local => write!(f, "local"),
        }
    }
}

/// A transcript and where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedTranscript {
    /// Video ID or file path.
    pub id: String,
    /// Title, when the source reports one.
    pub title: Option<String>,
    pub source_type: SourceType,
    pub text: String,
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn source_type(&self) -> SourceType;

    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;

    /// Fetch the transcript for `input`.
    async fn fetch(&self, input: &str) -> Result<FetchedTranscript>;
}

/// Detect the appropriate source for the given input.
pub fn detect_source(input: &str, settings: &Settings) -> Option<Box<dyn TranscriptSource>> {
    let youtube = YoutubeSource::new(settings.temp_dir()).with_transcription(&settings.transcription);
    if youtube.can_handle(input) {
        return Some(Box::new(youtube));
    }

    let local = LocalSource::new();
    if local.can_handle(input) {
        return Some(Box::new(local));
    }

    None
}

/// Fetch a transcript from whichever source handles `input`.
pub async fn fetch_transcript(input: &str, settings: &Settings) -> Result<FetchedTranscript> {
    let source = detect_source(input, settings).ok_or_else(|| {
        VidbriefError::InvalidArgument(format!(
            "Not a YouTube URL/ID or a transcript file (.txt, .md, .vtt, .srt): {}",
            input
        ))
    })?;

    let transcript = source.fetch(input).await?;
    if transcript.text.trim().is_empty() {
        return Err(VidbriefError::TranscriptSource(format!(
            "Transcript for {} is empty",
            transcript.id
        )));
    }

    tracing::info!(
        "Fetched {} transcript {} ({} chars)",
        transcript.source_type,
        transcript.id,
        transcript.text.len()
    );
    Ok(transcript)
}
