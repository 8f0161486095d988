//! CLI command implementations.

mod analyze;
mod ask;
mod chat;
mod config;
mod quiz;
mod search;

pub use analyze::run_analyze;
pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use quiz::run_quiz;
pub use search::run_search;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript_source::{fetch_transcript, FetchedTranscript};
use anyhow::Result;

/// Run pre-flight checks and fetch the transcript for `input`.
async fn prepare(operation: Operation, input: &str, settings: &Settings) -> Result<FetchedTranscript> {
    if let Err(e) = preflight::check(operation, settings, input) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let spinner = Output::spinner("Fetching transcript...");
    let fetched = fetch_transcript(input, settings).await;
    spinner.finish_and_clear();

    match fetched {
        Ok(transcript) => {
            let label = transcript.title.as_deref().unwrap_or(&transcript.id);
            Output::success(&format!(
                "Loaded transcript: {} ({} characters)",
                label,
                transcript.text.chars().count()
            ));
            Ok(transcript)
        }
        Err(e) => {
            Output::error(&format!("Transcript fetch failed: {}", e));
            Err(e.into())
        }
    }
}
