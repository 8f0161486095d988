//! Parser for model-generated multiple-choice quizzes.
//!
//! Accepted layout, per question:
//!
//! ```text
//! Question 1: What is the boiling point of water?
//! a) 50 degrees
//! b) 100 degrees
//! c) 150 degrees
//! d) 200 degrees
//!
//! Correct Answer: b
//! ```
//!
//! A block starts at a `Question <n>:` line (case-insensitive). The question
//! text is every non-empty line before the first option. Options are
//! `<letter>) text` or `<letter>. text` for letters a to d; a line that is none
//! of these continues the previous option. `Correct Answer: <letter>` closes
//! the block. Blocks missing any part are dropped without affecting the rest.

use super::{OptionLetter, QuizQuestion};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

struct Patterns {
    header: Regex,
    option: Regex,
    answer: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        header: Regex::new(r"(?i)^\s*\**\s*question\s+\d+\s*[:.]\**\s*(.*)$").expect("valid regex"),
        option: Regex::new(r"(?i)^\s*\(?([a-d])[).]\s*(.*)$").expect("valid regex"),
        answer: Regex::new(r"(?i)^\s*\**\s*correct\s+answer\s*:\**\s*\(?([a-d])\b").expect("valid regex"),
    })
}

#[derive(Default)]
struct Block {
    question: Vec<String>,
    options: [Option<String>; 4],
    last_option: Option<usize>,
    correct: Option<OptionLetter>,
}

impl Block {
    fn push_line(&mut self, line: &str) {
        let p = patterns();
        let trimmed = line.trim();
        if trimmed.is_empty() || self.correct.is_some() {
            return;
        }

        if let Some(caps) = p.answer.captures(trimmed) {
            self.correct = OptionLetter::from_char(caps[1].chars().next().unwrap_or(' '));
            return;
        }

        if let Some(caps) = p.option.captures(trimmed) {
            if let Some(letter) = OptionLetter::from_char(caps[1].chars().next().unwrap_or(' ')) {
                let slot = letter.index();
                if self.options[slot].is_none() {
                    self.options[slot] = Some(caps[2].trim().to_string());
                    self.last_option = Some(slot);
                    return;
                }
            }
        }

        match self.last_option {
            Some(slot) => {
                if let Some(text) = self.options[slot].as_mut() {
                    text.push(' ');
                    text.push_str(trimmed);
                }
            }
            None => self.question.push(trimmed.to_string()),
        }
    }

    fn finish(self) -> Option<QuizQuestion> {
        let question = self.question.join(" ");
        if question.is_empty() {
            return None;
        }
        let [a, b, c, d] = self.options;
        let options = [a?, b?, c?, d?];
        if options.iter().any(|o| o.is_empty()) {
            return None;
        }
        Some(QuizQuestion {
            question,
            options,
            correct: self.correct?,
        })
    }
}

/// Parse raw quiz text into questions, skipping malformed blocks.
pub fn parse_quiz_questions(raw: &str) -> Vec<QuizQuestion> {
    let p = patterns();
    let mut questions = Vec::new();
    let mut current: Option<Block> = None;
    let mut dropped = 0;

    let mut close = |block: Option<Block>, questions: &mut Vec<QuizQuestion>| {
        if let Some(block) = block {
            match block.finish() {
                Some(q) => questions.push(q),
                None => dropped += 1,
            }
        }
    };

    for line in raw.lines() {
        if let Some(caps) = p.header.captures(line) {
            close(current.take(), &mut questions);
            let mut block = Block::default();
            block.push_line(&caps[1]);
            current = Some(block);
        } else if let Some(block) = current.as_mut() {
            block.push_line(line);
        }
    }
    close(current.take(), &mut questions);

    if dropped > 0 {
        debug!("Dropped {} malformed quiz blocks", dropped);
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Here are your questions.

Question 1: What color is the sky?
a) Green
b) Blue
c) Red
d) Yellow

Correct Answer: b

Question 2: At what temperature does water boil?
a) 50 degrees
b) 75 degrees
c) 100 degrees
d) 125 degrees

Correct Answer: C

Question 3: Which unit was used?
a) Kelvin
b) Fahrenheit
c) Rankine

Correct Answer: a

Question 4: What was the main topic?
a. Weather
b. Basic science facts
c. Cooking
d. Sports
Correct Answer: b
";

    #[test]
    fn test_malformed_block_is_dropped() {
        let questions = parse_quiz_questions(SAMPLE);
        assert_eq!(questions.len(), 3);

        assert_eq!(questions[0].question, "What color is the sky?");
        assert_eq!(questions[0].options[1], "Blue");
        assert_eq!(questions[0].correct, OptionLetter::B);

        assert_eq!(questions[1].correct, OptionLetter::C);
        assert_eq!(questions[2].question, "What was the main topic?");
        assert_eq!(questions[2].options[1], "Basic science facts");
    }

    #[test]
    fn test_question_text_on_following_line() {
        let raw = "QUESTION 1:\nWhich is largest?\na) Mouse\nb) Whale\nc) Cat\nd) Dog\nCorrect answer: (b)";
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Which is largest?");
        assert_eq!(questions[0].correct, OptionLetter::B);
    }

    #[test]
    fn test_option_continuation_lines() {
        let raw = "Question 1: Pick one\na) first part\n   second part\nb) two\nc) three\nd) four\nCorrect Answer: a";
        let questions = parse_quiz_questions(raw);
        assert_eq!(questions[0].options[0], "first part second part");
    }

    #[test]
    fn test_missing_answer_or_question() {
        let no_answer = "Question 1: Q?\na) 1\nb) 2\nc) 3\nd) 4\n";
        assert!(parse_quiz_questions(no_answer).is_empty());

        let no_question = "Question 1:\na) 1\nb) 2\nc) 3\nd) 4\nCorrect Answer: d";
        assert!(parse_quiz_questions(no_question).is_empty());
    }

    #[test]
    fn test_garbage_input() {
        assert!(parse_quiz_questions("").is_empty());
        assert!(parse_quiz_questions("I could not create a quiz.").is_empty());
    }
}
