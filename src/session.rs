//! Per-transcript session state.
//!
//! A session owns one transcript, the index built from it, the chat history
//! and the current quiz. Loading a new transcript starts over.
//!
//! ```text
//! Empty --load--> TranscriptLoaded --attach_index--> Indexed
//!                        |
//!                        +--mark_index_failed--> QaUnavailable
//! ```

use crate::error::{Result, VidbriefError};
use crate::quiz::{score, OptionLetter, QuizQuestion, QuizScore};
use crate::rag::Answer;
use crate::transcript::Summary;
use crate::vector_store::VectorIndex;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

/// Where a session stands with respect to question answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    TranscriptLoaded,
    Indexed,
    QaUnavailable,
}

/// Where the current quiz stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    NotGenerated,
    InProgress,
    Submitted,
}

/// One question and its answer. Never modified once recorded.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    /// Success flag copied from the [`Answer`], not a probability.
    pub confidence: f32,
    pub asked_at: DateTime<Utc>,
}

#[derive(Debug)]
enum IndexState {
    NotBuilt,
    Ready(VectorIndex),
    Failed(String),
}

#[derive(Debug)]
struct QuizState {
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<OptionLetter>>,
    phase: QuizPhase,
    score: Option<QuizScore>,
}

impl Default for QuizState {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            answers: Vec::new(),
            phase: QuizPhase::NotGenerated,
            score: None,
        }
    }
}

/// State of one analysis session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    transcript: Option<String>,
    display_transcript: Option<String>,
    summary: Option<Summary>,
    index: IndexState,
    history: Vec<ChatTurn>,
    quiz: QuizState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            transcript: None,
            display_transcript: None,
            summary: None,
            index: IndexState::NotBuilt,
            history: Vec::new(),
            quiz: QuizState::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.transcript, &self.index) {
            (None, _) => SessionPhase::Empty,
            (Some(_), IndexState::NotBuilt) => SessionPhase::TranscriptLoaded,
            (Some(_), IndexState::Ready(_)) => SessionPhase::Indexed,
            (Some(_), IndexState::Failed(_)) => SessionPhase::QaUnavailable,
        }
    }

    pub fn quiz_phase(&self) -> QuizPhase {
        self.quiz.phase
    }

    /// Load a transcript, discarding everything derived from the previous one.
    pub fn load_transcript(&mut self, transcript: impl Into<String>) -> Result<()> {
        let transcript = transcript.into();
        if transcript.trim().is_empty() {
            return Err(VidbriefError::InvalidArgument(
                "transcript is empty".to_string(),
            ));
        }

        debug!(session = %self.id, "Loading transcript ({} chars)", transcript.len());
        self.transcript = Some(transcript);
        self.display_transcript = None;
        self.summary = None;
        self.index = IndexState::NotBuilt;
        self.history.clear();
        self.quiz = QuizState::default();
        Ok(())
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// The punctuated transcript if there is one, else the raw transcript.
    pub fn display_transcript(&self) -> Option<&str> {
        self.display_transcript.as_deref().or(self.transcript.as_deref())
    }

    pub fn set_display_transcript(&mut self, text: String) -> Result<()> {
        self.require_transcript("set a display transcript")?;
        self.display_transcript = Some(text);
        Ok(())
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn set_summary(&mut self, summary: Summary) -> Result<()> {
        self.require_transcript("set a summary")?;
        self.summary = Some(summary);
        Ok(())
    }

    /// Attach the index built from the current transcript.
    pub fn attach_index(&mut self, index: VectorIndex) -> Result<()> {
        self.require_phase(SessionPhase::TranscriptLoaded, "attach an index")?;
        self.index = IndexState::Ready(index);
        Ok(())
    }

    /// Record that indexing failed. Question answering stays disabled.
    pub fn mark_index_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.require_phase(SessionPhase::TranscriptLoaded, "mark indexing failed")?;
        let reason = reason.into();
        warn!(session = %self.id, "Q&A unavailable: {}", reason);
        self.index = IndexState::Failed(reason);
        Ok(())
    }

    /// Why question answering is unavailable, if it is.
    pub fn qa_unavailable_reason(&self) -> Option<&str> {
        match &self.index {
            IndexState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn index(&self) -> Result<&VectorIndex> {
        match &self.index {
            IndexState::Ready(index) => Ok(index),
            IndexState::Failed(reason) => Err(VidbriefError::InvalidState(format!(
                "question answering is unavailable: {}",
                reason
            ))),
            IndexState::NotBuilt => Err(VidbriefError::InvalidState(
                "transcript has not been indexed".to_string(),
            )),
        }
    }

    /// Append a turn to the chat history.
    pub fn record_turn(&mut self, question: &str, answer: &Answer) -> Result<&ChatTurn> {
        self.index()?;
        self.history.push(ChatTurn {
            question: question.to_string(),
            answer: answer.text.clone(),
            confidence: answer.confidence,
            asked_at: Utc::now(),
        });
        Ok(&self.history[self.history.len() - 1])
    }

    /// Chat turns, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Start a new quiz, replacing any previous one.
    pub fn start_quiz(&mut self, questions: Vec<QuizQuestion>) -> Result<()> {
        self.require_transcript("start a quiz")?;
        if questions.is_empty() {
            return Err(VidbriefError::InvalidArgument(
                "quiz has no questions".to_string(),
            ));
        }

        self.quiz = QuizState {
            answers: vec![None; questions.len()],
            questions,
            phase: QuizPhase::InProgress,
            score: None,
        };
        Ok(())
    }

    pub fn quiz_questions(&self) -> &[QuizQuestion] {
        &self.quiz.questions
    }

    pub fn quiz_answers(&self) -> &[Option<OptionLetter>] {
        &self.quiz.answers
    }

    /// Record or change the answer to question `index` (zero-based).
    pub fn answer_quiz(&mut self, index: usize, letter: OptionLetter) -> Result<()> {
        if self.quiz.phase != QuizPhase::InProgress {
            return Err(VidbriefError::InvalidState(format!(
                "cannot answer a quiz in phase {:?}",
                self.quiz.phase
            )));
        }
        let slot = self.quiz.answers.get_mut(index).ok_or_else(|| {
            VidbriefError::InvalidArgument(format!("no quiz question at position {}", index.saturating_add(1)))
        })?;
        *slot = Some(letter);
        Ok(())
    }

    /// Grade the quiz. Unanswered questions count as wrong.
    pub fn submit_quiz(&mut self) -> Result<QuizScore> {
        if self.quiz.phase != QuizPhase::InProgress {
            return Err(VidbriefError::InvalidState(format!(
                "cannot submit a quiz in phase {:?}",
                self.quiz.phase
            )));
        }
        let result = score(&self.quiz.questions, &self.quiz.answers);
        self.quiz.phase = QuizPhase::Submitted;
        self.quiz.score = Some(result);
        Ok(result)
    }

    pub fn quiz_score(&self) -> Option<QuizScore> {
        self.quiz.score
    }

    fn require_transcript(&self, action: &str) -> Result<()> {
        if self.transcript.is_none() {
            return Err(VidbriefError::InvalidState(format!(
                "cannot {} before a transcript is loaded",
                action
            )));
        }
        Ok(())
    }

    fn require_phase(&self, expected: SessionPhase, action: &str) -> Result<()> {
        let phase = self.phase();
        if phase != expected {
            return Err(VidbriefError::InvalidState(format!(
                "cannot {} in phase {:?}",
                action, phase
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn index() -> VectorIndex {
        let chunk = Chunk {
            id: 0,
            text: "hello".to_string(),
            start_offset: 0,
            end_offset: 5,
        };
        VectorIndex::build(vec![chunk], vec![vec![1.0, 0.0]], "test").unwrap()
    }

    fn answer(text: &str) -> Answer {
        Answer {
            text: text.to_string(),
            confidence: 1.0,
        }
    }

    fn question(correct: OptionLetter) -> QuizQuestion {
        QuizQuestion {
            question: "Q?".to_string(),
            options: ["1".into(), "2".into(), "3".into(), "4".into()],
            correct,
        }
    }

    #[test]
    fn test_happy_path() {
        let mut session = Session::new();
        assert_eq!(session.phase(), SessionPhase::Empty);

        session.load_transcript("hello world").unwrap();
        assert_eq!(session.phase(), SessionPhase::TranscriptLoaded);

        session.attach_index(index()).unwrap();
        assert_eq!(session.phase(), SessionPhase::Indexed);

        session.record_turn("first?", &answer("one")).unwrap();
        session.record_turn("second?", &answer("two")).unwrap();
        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "first?");
        assert!(history[0].asked_at <= history[1].asked_at);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = Session::new();
        assert!(matches!(
            session.attach_index(index()),
            Err(VidbriefError::InvalidState(_))
        ));
        assert!(matches!(
            session.record_turn("q", &answer("a")),
            Err(VidbriefError::InvalidState(_))
        ));
        assert!(matches!(
            session.start_quiz(vec![question(OptionLetter::A)]),
            Err(VidbriefError::InvalidState(_))
        ));

        session.load_transcript("text").unwrap();
        session.attach_index(index()).unwrap();
        assert!(matches!(
            session.attach_index(index()),
            Err(VidbriefError::InvalidState(_))
        ));
    }

    #[test]
    fn test_index_failure_disables_qa() {
        let mut session = Session::new();
        session.load_transcript("text").unwrap();
        session.mark_index_failed("embedding backend down").unwrap();

        assert_eq!(session.phase(), SessionPhase::QaUnavailable);
        assert_eq!(session.qa_unavailable_reason(), Some("embedding backend down"));
        assert!(matches!(
            session.record_turn("q", &answer("a")),
            Err(VidbriefError::InvalidState(_))
        ));
    }

    #[test]
    fn test_reload_resets_everything() {
        let mut session = Session::new();
        session.load_transcript("first").unwrap();
        session.attach_index(index()).unwrap();
        session.record_turn("q", &answer("a")).unwrap();
        session.start_quiz(vec![question(OptionLetter::A)]).unwrap();

        session.load_transcript("second").unwrap();
        assert_eq!(session.phase(), SessionPhase::TranscriptLoaded);
        assert!(session.history().is_empty());
        assert_eq!(session.quiz_phase(), QuizPhase::NotGenerated);
        assert_eq!(session.transcript(), Some("second"));
    }

    #[test]
    fn test_blank_transcript_rejected() {
        let mut session = Session::new();
        assert!(matches!(
            session.load_transcript("  "),
            Err(VidbriefError::InvalidArgument(_))
        ));
        assert_eq!(session.phase(), SessionPhase::Empty);
    }

    #[test]
    fn test_quiz_flow() {
        let mut session = Session::new();
        session.load_transcript("text").unwrap();
        session
            .start_quiz(vec![question(OptionLetter::A), question(OptionLetter::B)])
            .unwrap();
        assert_eq!(session.quiz_phase(), QuizPhase::InProgress);

        session.answer_quiz(0, OptionLetter::C).unwrap();
        session.answer_quiz(0, OptionLetter::A).unwrap();
        assert!(matches!(
            session.answer_quiz(5, OptionLetter::A),
            Err(VidbriefError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.answer_quiz(usize::MAX, OptionLetter::A),
            Err(VidbriefError::InvalidArgument(_))
        ));

        let result = session.submit_quiz().unwrap();
        assert_eq!(result, QuizScore { correct: 1, total: 2 });
        assert_eq!(session.quiz_phase(), QuizPhase::Submitted);
        assert_eq!(session.quiz_score(), Some(result));

        assert!(matches!(
            session.answer_quiz(1, OptionLetter::B),
            Err(VidbriefError::InvalidState(_))
        ));
        assert!(matches!(session.submit_quiz(), Err(VidbriefError::InvalidState(_))));

        session.start_quiz(vec![question(OptionLetter::D)]).unwrap();
        assert_eq!(session.quiz_answers().to_vec(), vec![None]);
    }

    #[test]
    fn test_display_transcript_prefers_punctuated() {
        let mut session = Session::new();
        session.load_transcript("raw text").unwrap();
        assert_eq!(session.display_transcript(), Some("raw text"));
        session.set_display_transcript("Raw text.".to_string()).unwrap();
        assert_eq!(session.display_transcript(), Some("Raw text."));
        assert_eq!(session.transcript(), Some("raw text"));
    }
}
