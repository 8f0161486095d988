//! Local transcript files.
//!
//! Plain text is read as-is; caption files are flattened to text.

use super::{captions_to_text, FetchedTranscript, SourceType, TranscriptSource};
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use std::path::Path;

/// Extensions read verbatim.
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

/// Caption extensions, converted to plain text.
const CAPTION_EXTENSIONS: &[&str] = &["vtt", "srt"];

/// Local file source for transcripts and caption files.
pub struct LocalSource;

impl LocalSource {
    pub fn new() -> Self {
        Self
    }

    fn extension(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
    }

    fn is_text_file(path: &Path) -> bool {
        Self::extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
    }

    fn is_caption_file(path: &Path) -> bool {
        Self::extension(path).is_some_and(|ext| CAPTION_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for LocalSource {
    fn source_type(&self) -> SourceType {
        SourceType::Local
    }

    fn can_handle(&self, input: &str) -> bool {
        let path = Path::new(input);
        Self::is_text_file(path) || Self::is_caption_file(path)
    }

    async fn fetch(&self, input: &str) -> Result<FetchedTranscript> {
        let path = Path::new(input);

        if !path.exists() {
            return Err(VidbriefError::TranscriptSource(format!(
                "File not found: {}",
                input
            )));
        }

        let raw = tokio::fs::read_to_string(path).await?;
        let text = if Self::is_caption_file(path) {
            captions_to_text(&raw)
        } else if Self::is_text_file(path) {
            raw
        } else {
            return Err(VidbriefError::InvalidArgument(format!(
                "Not a recognized transcript file: {}",
                input
            )));
        };

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string());

        Ok(FetchedTranscript {
            id: input.to_string(),
            title,
            source_type: SourceType::Local,
            text,
        })
    }
}
