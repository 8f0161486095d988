//! CLI module for VidBrief.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// VidBrief - Transcript summaries, questions and quizzes
///
/// Summarize a video or transcript, ask questions grounded in it, and test
/// yourself with a generated quiz.
#[derive(Parser, Debug)]
#[command(name = "vidbrief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "VIDBRIEF_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a transcript and index it for questions
    Analyze {
        /// YouTube URL/ID, or transcript file (.txt, .md, .vtt, .srt)
        input: String,

        /// Skip the punctuation pass
        #[arg(long)]
        no_punctuate: bool,

        /// Print the (punctuated) transcript
        #[arg(long)]
        show_transcript: bool,
    },

    /// Ask a single question about a transcript
    Ask {
        /// YouTube URL/ID, or transcript file
        input: String,

        /// The question to ask
        question: String,

        /// Number of transcript chunks used as context
        #[arg(short)]
        k: Option<usize>,
    },

    /// Start an interactive question session about a transcript
    Chat {
        /// YouTube URL/ID, or transcript file
        input: String,

        /// Number of transcript chunks used as context
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show the transcript chunks most similar to a query
    Search {
        /// YouTube URL/ID, or transcript file
        input: String,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, default_value = "5")]
        k: usize,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(short, long)]
        min_score: Option<f32>,
    },

    /// Take a multiple-choice quiz about a transcript
    Quiz {
        /// YouTube URL/ID, or transcript file
        input: String,

        /// Number of questions to request
        #[arg(short)]
        n: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "vidbrief", "-vv", "search", "talk.txt", "borrow checker", "-k", "3", "--min-score", "0.2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { input, query, k, min_score } => {
                assert_eq!(input, "talk.txt");
                assert_eq!(query, "borrow checker");
                assert_eq!(k, 3);
                assert_eq!(min_score, Some(0.2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
