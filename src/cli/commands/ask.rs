//! Ask command implementation.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(input: &str, question: &str, k: Option<usize>, settings: Settings) -> Result<()> {
    let transcript = prepare(Operation::Ask, input, &settings).await?;
    let k = k.unwrap_or(settings.retrieval.top_k);

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner("Indexing transcript...");
    let indexed = orchestrator.index_only(&mut session, &transcript.text).await;
    spinner.finish_and_clear();
    if let Err(e) = indexed {
        Output::error(&format!("Q&A unavailable: {}", e));
        return Err(e.into());
    }

    let spinner = Output::spinner("Thinking...");
    let turn = orchestrator.ask(&mut session, question, k).await;
    spinner.finish_and_clear();

    match turn {
        Ok(turn) => {
            Output::answer(&turn.answer, turn.confidence);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            Err(e.into())
        }
    }
}
