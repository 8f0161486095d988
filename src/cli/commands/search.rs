//! Search command implementation.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    input: &str,
    query: &str,
    k: usize,
    min_score: Option<f32>,
    mut settings: Settings,
) -> Result<()> {
    let transcript = prepare(Operation::Search, input, &settings).await?;
    if let Some(min_score) = min_score {
        settings.retrieval.min_score = min_score;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner("Indexing and searching...");
    let results = match orchestrator.index_only(&mut session, &transcript.text).await {
        Ok(_) => orchestrator.search(&session, query, k).await,
        Err(e) => Err(e),
    };
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            if hits.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", hits.len()));

                for (rank, hit) in hits.iter().enumerate() {
                    Output::search_result(rank + 1, hit.chunk.id, hit.score, &hit.chunk.text);
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
