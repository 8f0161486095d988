//! Quiz command implementation.

use super::prepare;
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::quiz::{OptionLetter, QuizQuestion};
use crate::session::Session;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the quiz command.
pub async fn run_quiz(input: &str, n: Option<usize>, settings: Settings) -> Result<()> {
    let transcript = prepare(Operation::Quiz, input, &settings).await?;
    let num_questions = n.unwrap_or(settings.quiz.num_questions).max(1);

    let orchestrator = Orchestrator::new(settings)?;
    let mut session = Session::new();
    session.load_transcript(transcript.text)?;

    let spinner = Output::spinner("Generating quiz questions from transcript...");
    let generated = orchestrator.generate_quiz(&mut session, num_questions).await;
    spinner.finish_and_clear();

    if generated? == 0 {
        Output::warning("The model did not produce any usable questions. Try again.");
        return Ok(());
    }

    let questions: Vec<QuizQuestion> = session.quiz_questions().to_vec();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (i, question) in questions.iter().enumerate() {
        print_question(i + 1, question);

        loop {
            print!("{} ", style("Your answer (a-d):").green().bold());
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }
            match line.parse::<OptionLetter>() {
                Ok(letter) => {
                    session.answer_quiz(i, letter)?;
                    break;
                }
                Err(_) => Output::warning("Please answer with a, b, c or d."),
            }
        }
    }

    let score = session.submit_quiz()?;

    Output::header("Results");
    for (i, (question, answer)) in questions.iter().zip(session.quiz_answers()).enumerate() {
        let mark = if answer.is_some_and(|a| question.is_correct(a)) {
            style("correct").green()
        } else {
            style("wrong").red()
        };
        Output::list_item(&format!(
            "Q{}: {} (answer: {}) {}",
            i + 1,
            mark,
            question.correct,
            question.option(question.correct)
        ));
    }
    println!();
    Output::success(&format!("Score: {}", score));

    Ok(())
}

fn print_question(number: usize, question: &QuizQuestion) {
    println!("\n{} {}", style(format!("Question {}:", number)).bold(), question.question);
    for letter in OptionLetter::ALL {
        println!("  {}) {}", letter, question.option(letter));
    }
}
