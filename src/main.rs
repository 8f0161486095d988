//! VidBrief CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vidbrief::cli::{commands, Cli, Commands};
use vidbrief::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("vidbrief={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    match &cli.command {
        Commands::Analyze {
            input,
            no_punctuate,
            show_transcript,
        } => {
            commands::run_analyze(input, *no_punctuate, *show_transcript, settings).await?;
        }

        Commands::Ask { input, question, k } => {
            commands::run_ask(input, question, *k, settings).await?;
        }

        Commands::Chat { input, k } => {
            commands::run_chat(input, *k, settings).await?;
        }

        Commands::Search {
            input,
            query,
            k,
            min_score,
        } => {
            commands::run_search(input, query, *k, *min_score, settings).await?;
        }

        Commands::Quiz { input, n } => {
            commands::run_quiz(input, *n, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path)?;
        }
    }

    Ok(())
}
