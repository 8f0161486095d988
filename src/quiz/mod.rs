//! Multiple-choice comprehension quizzes generated from a transcript.

mod parser;

pub use parser::parse_quiz_questions;

use crate::config::Prompts;
use crate::generation::{generate_within, Generator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const QUIZ_MAX_TOKENS: u32 = 1500;
const QUIZ_TEMPERATURE: f32 = 0.3;

/// Letter of a quiz option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [OptionLetter::A, OptionLetter::B, OptionLetter::C, OptionLetter::D];

    /// Parse a single letter, case-insensitive.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(OptionLetter::A),
            'b' => Some(OptionLetter::B),
            'c' => Some(OptionLetter::C),
            'd' => Some(OptionLetter::D),
            _ => None,
        }
    }

    /// Position in the option list.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_char(self) -> char {
        (b'a' + self as u8) as char
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl std::str::FromStr for OptionLetter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                OptionLetter::from_char(c).ok_or_else(|| format!("Not an option letter: {}", s))
            }
            _ => Err(format!("Not an option letter: {}", s)),
        }
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    /// Option texts for a, b, c and d, in order.
    pub options: [String; 4],
    pub correct: OptionLetter,
}

impl QuizQuestion {
    pub fn option(&self, letter: OptionLetter) -> &str {
        &self.options[letter.index()]
    }

    pub fn is_correct(&self, letter: OptionLetter) -> bool {
        self.correct == letter
    }
}

/// Result of grading a submitted quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    /// Share of correct answers, 0 to 100. An empty quiz scores 0.
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f32 * 100.0 / self.total as f32
    }
}

impl fmt::Display for QuizScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.0}%)", self.correct, self.total, self.percent())
    }
}

/// Grade answers against questions. Unanswered questions count as wrong.
pub fn score(questions: &[QuizQuestion], answers: &[Option<OptionLetter>]) -> QuizScore {
    let correct = questions
        .iter()
        .zip(answers.iter().chain(std::iter::repeat(&None)))
        .filter(|(q, a)| a.is_some_and(|letter| q.is_correct(letter)))
        .count();

    QuizScore {
        correct,
        total: questions.len(),
    }
}

/// Generates quizzes through the generation service.
pub struct QuizGenerator {
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    timeout: Duration,
}

impl QuizGenerator {
    pub fn new(generator: Arc<dyn Generator>, prompts: Prompts, timeout: Duration) -> Self {
        Self {
            generator,
            prompts,
            timeout,
        }
    }

    /// Raw quiz text for `num_questions` questions, or an empty string on failure.
    #[instrument(skip(self, transcript))]
    pub async fn generate(&self, transcript: &str, num_questions: usize) -> String {
        let count = num_questions.to_string();
        let prompt = self.prompts.render_with_custom(
            &self.prompts.quiz,
            &[("transcript", transcript), ("num_questions", &count)],
        );

        match generate_within(
            self.generator.as_ref(),
            &prompt,
            QUIZ_MAX_TOKENS,
            QUIZ_TEMPERATURE,
            self.timeout,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("Quiz generation failed: {}", e);
                String::new()
            }
        }
    }

    /// Generate and parse a quiz.
    pub async fn generate_questions(&self, transcript: &str, num_questions: usize) -> Vec<QuizQuestion> {
        let raw = self.generate(transcript, num_questions).await;
        let questions = parse_quiz_questions(&raw);
        info!("Generated {} of {} quiz questions", questions.len(), num_questions);
        questions
    }
}
