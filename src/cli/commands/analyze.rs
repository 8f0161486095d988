//! Analyze command implementation.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::output::content_preview;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;

/// Characters of transcript shown by `--show-transcript`.
const TRANSCRIPT_PREVIEW_CHARS: usize = 5000;

/// Run the analyze command.
pub async fn run_analyze(
    input: &str,
    no_punctuate: bool,
    show_transcript: bool,
    settings: Settings,
) -> Result<()> {
    let transcript = prepare(Operation::Analyze, input, &settings).await?;
    let punctuate = settings.general.punctuate && !no_punctuate;

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner(if punctuate {
        "Punctuating, summarizing and indexing..."
    } else {
        "Summarizing and indexing..."
    });
    let report = orchestrator
        .analyze(&mut session, &transcript.text, punctuate)
        .await;
    spinner.finish_and_clear();
    let report = report?;

    if show_transcript {
        if let Some(text) = session.display_transcript() {
            Output::header("Transcript");
            println!("{}", content_preview(text, TRANSCRIPT_PREVIEW_CHARS));
        }
    }

    Output::header("Summary");
    println!("{}", report.summary.text);
    if !report.summary.available {
        Output::warning("Summarization failed; see logs with -v for details.");
    }

    Output::header("Index");
    match (report.chunks_indexed, report.qa_error.as_deref()) {
        (Some(count), _) => {
            Output::kv("Chunks", &count.to_string());
            Output::info(&format!(
                "Ask questions with: vidbrief ask {} \"<question>\"",
                input
            ));
        }
        (None, Some(reason)) => Output::warning(&format!("Q&A unavailable: {}", reason)),
        (None, None) => Output::warning("Q&A unavailable"),
    }

    Ok(())
}
