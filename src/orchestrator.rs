//! Pipeline orchestrator for VidBrief.
//!
//! Wires the embedder and generator chosen in [`Settings`] into the retriever,
//! answer synthesizer, transcript tools and quiz generator, and drives a
//! [`Session`] through them.

use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{Result, VidbriefError};
use crate::generation::{create_generator, Generator};
use crate::quiz::QuizGenerator;
use crate::rag::{AnswerSynthesizer, Retriever};
use crate::session::{ChatTurn, Session};
use crate::transcript::{Summary, TranscriptTools};
use crate::vector_store::SearchHit;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Outcome of analyzing one transcript.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub summary: Summary,
    /// Number of chunks indexed, or `None` when indexing failed.
    pub chunks_indexed: Option<usize>,
    /// Why question answering is unavailable, if it is.
    pub qa_error: Option<String>,
}

impl AnalysisReport {
    pub fn qa_available(&self) -> bool {
        self.chunks_indexed.is_some()
    }
}

/// The main orchestrator for the VidBrief pipeline.
pub struct Orchestrator {
    settings: Settings,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    tools: TranscriptTools,
    quiz: QuizGenerator,
}

impl Orchestrator {
    /// Create an orchestrator with the backends named in `settings`.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder = create_embedder(&settings.embedding)?;
        let generator = create_generator(&settings.generation)?;
        info!(
            "Using embedder {} and generator {}",
            embedder.model_id(),
            generator.model_id()
        );
        Self::with_components(settings, embedder, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let generation_timeout = Duration::from_secs(settings.generation.timeout_secs);

        let retriever = Retriever::new(embedder, settings.chunking.to_config()?)?
            .with_timeout(Duration::from_secs(settings.embedding.timeout_secs));
        let synthesizer = AnswerSynthesizer::new(generator.clone())
            .with_prompts(prompts.clone())
            .with_timeout(generation_timeout);
        let tools = TranscriptTools::new(generator.clone(), prompts.clone(), generation_timeout);
        let quiz = QuizGenerator::new(generator, prompts, generation_timeout);

        Ok(Self {
            settings,
            retriever,
            synthesizer,
            tools,
            quiz,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load a transcript, optionally punctuate it, then summarize and index it.
    ///
    /// Summarization and indexing run concurrently. An indexing failure leaves
    /// the session in the Q&A-unavailable phase but still delivers the summary.
    #[instrument(skip(self, session, transcript), fields(session_id = %session.id()))]
    pub async fn analyze(
        &self,
        session: &mut Session,
        transcript: &str,
        punctuate: bool,
    ) -> Result<AnalysisReport> {
        session.load_transcript(transcript)?;

        if punctuate {
            let punctuated = self.tools.punctuate(transcript).await;
            session.set_display_transcript(punctuated)?;
        }

        let (summary, index) = futures::join!(
            self.tools.summarize(transcript),
            self.retriever.index_transcript(transcript)
        );

        session.set_summary(summary.clone())?;
        let (chunks_indexed, qa_error) = match index {
            Ok(index) => {
                let count = index.len();
                session.attach_index(index)?;
                (Some(count), None)
            }
            Err(e) => {
                let reason = e.to_string();
                session.mark_index_failed(reason.clone())?;
                (None, Some(reason))
            }
        };

        Ok(AnalysisReport {
            summary,
            chunks_indexed,
            qa_error,
        })
    }

    /// Load and index a transcript without summarizing it.
    ///
    /// Indexing errors are returned, after marking Q&A unavailable.
    #[instrument(skip(self, session, transcript), fields(session_id = %session.id()))]
    pub async fn index_only(&self, session: &mut Session, transcript: &str) -> Result<usize> {
        session.load_transcript(transcript)?;

        match self.retriever.index_transcript(transcript).await {
            Ok(index) => {
                let count = index.len();
                session.attach_index(index)?;
                Ok(count)
            }
            Err(e) => {
                session.mark_index_failed(e.to_string())?;
                Err(e)
            }
        }
    }

    /// Answer a question from the session's index and record the turn.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn ask(&self, session: &mut Session, question: &str, k: usize) -> Result<ChatTurn> {
        let context = self
            .retriever
            .get_context(session.index()?, question, k)
            .await?;
        let answer = self.synthesizer.answer(question, &context).await;
        let turn = session.record_turn(question, &answer)?;
        Ok(turn.clone())
    }

    /// Rank transcript chunks against a query, dropping those under the configured minimum score.
    pub async fn search(&self, session: &Session, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        self.retriever
            .retrieve_with_threshold(
                session.index()?,
                query,
                k,
                self.settings.retrieval.min_score,
            )
            .await
    }

    /// Generate a quiz for the loaded transcript and start it.
    ///
    /// Returns the number of questions. Zero means generation or parsing
    /// produced nothing usable, and no quiz was started.
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    pub async fn generate_quiz(&self, session: &mut Session, num_questions: usize) -> Result<usize> {
        let transcript = match session.transcript() {
            Some(t) => t.to_string(),
            None => {
                return Err(VidbriefError::InvalidState(
                    "cannot generate a quiz before a transcript is loaded".to_string(),
                ))
            }
        };

        let questions = self.quiz.generate_questions(&transcript, num_questions).await;
        if questions.is_empty() {
            warn!("No usable quiz questions were generated");
            return Ok(0);
        }

        let count = questions.len();
        session.start_quiz(questions)?;
        Ok(count)
    }
}
