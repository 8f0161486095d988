//! VidBrief - Transcript summaries, grounded Q&A and quizzes
//!
//! Takes one transcript (YouTube captions or a local file), summarizes it,
//! answers free-form questions from it through retrieval-augmented generation,
//! and generates multiple-choice comprehension quizzes.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `chunking` - Sliding-window transcript chunking
//! - `embedding` - Embedding backends (local BERT, OpenAI, feature hashing)
//! - `vector_store` - In-memory cosine-similarity index
//! - `rag` - Retriever and answer synthesizer
//! - `generation` - Text generation backends (OpenAI, Anthropic)
//! - `transcript` - Punctuation and summarization
//! - `quiz` - Quiz generation, parsing and scoring
//! - `session` - Per-transcript session state
//! - `transcript_source` - Transcript acquisition (YouTube, local files)
//! - `orchestrator` - Pipeline coordination
//! - `config` - Configuration management
//!
//! # Example
//!
//! ```rust,no_run
//! use vidbrief::config::Settings;
//! use vidbrief::orchestrator::Orchestrator;
//! use vidbrief::session::Session;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(Settings::load()?)?;
//!     let mut session = Session::new();
//!
//!     let report = orchestrator
//!         .analyze(&mut session, "The sky is blue. Water boils at 100 degrees Celsius.", false)
//!         .await?;
//!     println!("{}", report.summary.text);
//!
//!     let turn = orchestrator.ask(&mut session, "What color is the sky?", 4).await?;
//!     println!("{} (confidence {:.1})", turn.answer, turn.confidence);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod quiz;
pub mod rag;
pub mod session;
pub mod transcript;
pub mod transcript_source;
pub mod vector_store;

pub use error::{Result, VidbriefError};
