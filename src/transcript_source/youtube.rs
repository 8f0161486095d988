//! YouTube captions via yt-dlp.

use super::whisper::{download_audio, WhisperTranscriber};
use super::{captions_to_text, FetchedTranscript, SourceType, TranscriptSource};
use crate::config::TranscriptionSettings;
use crate::error::{Result, VidbriefError};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument};
use url::Url;

fn video_id_regex() -> &'static Regex {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    VIDEO_ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid regex"))
}

/// Extract the video ID from a YouTube URL or bare ID.
///
/// Handles `youtube.com/watch?v=`, `youtu.be/`, `/embed/`, `/v/` and
/// `/shorts/` URLs, with or without a scheme.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if video_id_regex().is_match(input) {
        return Some(input.to_string());
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").or_else(|| host.strip_prefix("m.")).unwrap_or(host);

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next()? {
                "watch" => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                "embed" | "v" | "shorts" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    video_id_regex()
        .is_match(&candidate)
        .then_some(candidate)
}

/// YouTube transcript source.
///
/// Downloads English subtitles, manual or automatic, into a scratch directory
/// under `temp_dir`. The directory is removed once the captions are read.
/// Videos without captions are transcribed from their audio when a
/// transcription fallback is configured.
pub struct YoutubeSource {
    temp_dir: PathBuf,
    audio_fallback: Option<TranscriptionSettings>,
}

impl YoutubeSource {
    pub fn new(temp_dir: PathBuf) -> Self {
        Self {
            temp_dir,
            audio_fallback: None,
        }
    }

    /// Enable audio transcription if `settings` allows it.
    pub fn with_transcription(mut self, settings: &TranscriptionSettings) -> Self {
        self.audio_fallback = settings.audio_fallback.then(|| settings.clone());
        self
    }

    async fn transcribe_audio(
        &self,
        video_id: &str,
        dir: &Path,
        settings: &TranscriptionSettings,
    ) -> Result<String> {
        info!("No captions for {}, transcribing audio with {}", video_id, settings.model);
        let transcriber = WhisperTranscriber::from_settings(settings)?;
        let audio = download_audio(video_id, dir).await?;
        transcriber.transcribe(&audio).await
    }

    async fn download_captions(&self, video_id: &str, dir: &Path) -> Result<Option<String>> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let template = dir.join("%(id)s.%(ext)s");

        let output = tokio::process::Command::new("yt-dlp")
            .args([
                "--skip-download",
                "--no-simulate",
                "--write-subs",
                "--write-auto-subs",
                "--sub-langs",
                "en.*,en",
                "--sub-format",
                "vtt",
                "--no-warnings",
                "--print",
                "title",
                "-o",
            ])
            .arg(&template)
            .arg(&url)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    VidbriefError::ToolNotFound("yt-dlp".to_string())
                } else {
                    VidbriefError::TranscriptSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidbriefError::TranscriptSource(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(title).filter(|t| !t.is_empty()))
    }
}

/// Caption files in `dir`, sorted so the result is stable.
fn caption_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "vtt"))
        .collect();
    files.sort();
    Ok(files)
}

#[async_trait]
impl TranscriptSource for YoutubeSource {
    fn source_type(&self) -> SourceType {
        SourceType::YouTube
    }

    fn can_handle(&self, input: &str) -> bool {
        extract_video_id(input).is_some()
    }

    #[instrument(skip(self))]
    async fn fetch(&self, input: &str) -> Result<FetchedTranscript> {
        let video_id = extract_video_id(input).ok_or_else(|| {
            VidbriefError::InvalidArgument(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        std::fs::create_dir_all(&self.temp_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("captions-")
            .tempdir_in(&self.temp_dir)?;

        let title = self.download_captions(&video_id, scratch.path()).await?;

        let files = caption_files(scratch.path())?;
        let text = match (files.first(), &self.audio_fallback) {
            (Some(path), _) => {
                debug!("Reading captions from {:?}", path);
                captions_to_text(&tokio::fs::read_to_string(path).await?)
            }
            (None, Some(settings)) => {
                self.transcribe_audio(&video_id, scratch.path(), settings)
                    .await?
            }
            (None, None) => {
                return Err(VidbriefError::TranscriptSource(format!(
                    "No English captions available for video {}",
                    video_id
                )))
            }
        };

        Ok(FetchedTranscript {
            id: video_id,
            title,
            source_type: SourceType::YouTube,
            text,
        })
    }
}
