//! Interactive question session over one transcript.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(input: &str, k: Option<usize>, settings: Settings) -> Result<()> {
    let transcript = prepare(Operation::Ask, input, &settings).await?;
    let k = k.unwrap_or(settings.retrieval.top_k);

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();

    let spinner = Output::spinner("Indexing transcript...");
    let indexed = orchestrator.index_only(&mut session, &transcript.text).await;
    spinner.finish_and_clear();
    let chunks = match indexed {
        Ok(count) => count,
        Err(e) => {
            Output::error(&format!("Q&A unavailable: {}", e));
            return Err(e.into());
        }
    };

    println!("\n{}", style("VidBrief Chat").bold().cyan());
    println!(
        "{}\n",
        style(format!(
            "{} chunks indexed. Type your questions, 'history' to review, or 'exit' to quit.",
            chunks
        ))
        .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if line.eq_ignore_ascii_case("history") {
            print_history(&session);
            continue;
        }

        match orchestrator.ask(&mut session, line, k).await {
            Ok(turn) => {
                println!("\n{} {}", style("VidBrief:").cyan().bold(), turn.answer);
                println!("{}\n", style(format!("confidence: {:.2}", turn.confidence)).dim());
            }
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Ok(())
}

fn print_history(session: &Session) {
    if session.history().is_empty() {
        Output::info("No questions asked yet.");
        return;
    }

    Output::header("Chat History");
    for (i, turn) in session.history().iter().enumerate() {
        println!(
            "\n{} {} {}",
            style(format!("Q{}:", i + 1)).bold(),
            turn.question,
            style(turn.asked_at.format("%H:%M:%S")).dim()
        );
        println!("   {}", turn.answer);
        println!("   {}", style(format!("confidence: {:.2}", turn.confidence)).dim());
    }
    println!();
}
