//! Audio transcription for videos that have no captions.
//!
//! The best audio stream is downloaded with yt-dlp and sent to the OpenAI
//! transcription endpoint in one request, so files over the upload limit are
//! rejected rather than split.

use crate::config::TranscriptionSettings;
use crate::error::{Result, VidbriefError};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Formats the transcription endpoint accepts, in order of preference.
const AUDIO_EXTENSIONS: [&str; 5] = ["m4a", "mp3", "webm", "ogg", "opus"];

/// Whisper transcriber used as the caption fallback.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_bytes: u64,
}

impl WhisperTranscriber {
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self> {
        let client = create_client(
            settings.api_base.as_deref(),
            Duration::from_secs(settings.timeout_secs),
        )?;

        Ok(Self {
            client,
            model: settings.model.clone(),
            max_bytes: settings.max_audio_mb.saturating_mul(1024 * 1024),
        })
    }

    /// Transcribe one audio file to plain text.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        check_upload_size(audio_path, self.max_bytes)?;

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.m4a")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| {
                VidbriefError::TranscriptSource(format!("Failed to build transcription request: {}", e))
            })?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| VidbriefError::TranscriptSource(format!("{} API error: {}", self.model, e)))?;

        debug!("Transcribed {} characters", response.text.len());
        Ok(response.text.trim().to_string())
    }
}

/// Download the best audio stream of `video_id` into `dir`.
///
/// No re-encoding is done, so ffmpeg is not needed.
#[instrument(skip(dir))]
pub async fn download_audio(video_id: &str, dir: &Path) -> Result<PathBuf> {
    let url = format!("https://www.youtube.com/watch?v={}", video_id);
    let template = dir.join(format!("{}.%(ext)s", video_id));
    info!("Downloading audio for {}", video_id);

    let output = Command::new("yt-dlp")
        .args([
            "-f",
            "bestaudio[ext=m4a]/bestaudio",
            "--no-playlist",
            "--quiet",
            "--no-warnings",
            "-o",
        ])
        .arg(&template)
        .arg(&url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
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
            "Audio download failed for {}: {}",
            video_id,
            stderr.trim()
        )));
    }

    find_audio_file(dir, video_id).ok_or_else(|| {
        VidbriefError::TranscriptSource(format!("Audio file not found after download for {}", video_id))
    })
}

/// Locate a downloaded audio file for `video_id`.
fn find_audio_file(dir: &Path, video_id: &str) -> Option<PathBuf> {
    AUDIO_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", video_id, ext)))
        .find(|candidate| candidate.is_file())
}

fn check_upload_size(path: &Path, max_bytes: u64) -> Result<()> {
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(VidbriefError::TranscriptSource(format!(
            "Audio is {:.1} MB, over the {} MB transcription limit",
            size as f64 / (1024.0 * 1024.0),
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}
