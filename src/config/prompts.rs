//! Prompt templates for VidBrief.
//!
//! Defaults can be overridden by a `prompts.toml` in the custom prompts
//! directory. Any template left out of that file keeps its default.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// Adds punctuation and capitalization. Variables: `transcript`.
    pub punctuate: String,
    /// Condenses the transcript. Variables: `transcript`.
    pub summary: String,
    /// Grounded answer. Variables: `context`, `question`.
    pub answer: String,
    /// Multiple-choice quiz. Variables: `transcript`, `num_questions`.
    pub quiz: String,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            punctuate: r#"Please add proper punctuation, capitalization, and paragraph breaks to the following transcript.
Make it readable while preserving the original content and meaning. Don't change any words.

Transcript:
{{transcript}}
"#
            .to_string(),

            summary: r#"You are a helpful assistant. Summarize the following video transcript in a concise and clear way:

Transcript:
{{transcript}}

Summary:
"#
            .to_string(),

            answer: r#"You are a helpful assistant. Based on the following transcript excerpts, answer the user's question concisely and accurately.
Use only the information in the excerpts. If they do not contain the answer, say so.

Transcript excerpts:
{{context}}

Question:
{{question}}

Answer:
"#
            .to_string(),

            quiz: r#"Generate {{num_questions}} multiple-choice questions (MCQs) based on the following video transcript.
Each question should:
- Test comprehension of key concepts from the transcript
- Have 4 options (a-d) with only one correct answer
- Be clear and unambiguous
- Cover different parts of the content

Format each question exactly as follows:

Question X: [Your question here]
a) [Option A]
b) [Option B]
c) [Option C]
d) [Option D]

Correct Answer: [letter]

Transcript:
"""
{{transcript}}
"""
"#
            .to_string(),

            variables: HashMap::new(),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("valid regex"))
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("prompts.toml");
            if custom_path.exists() {
                let content = std::fs::read_to_string(&custom_path)?;
                prompts = toml::from_str(&content)?;
            }
        }

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass, so placeholder-like text inside a value
    /// is left alone. Unknown placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert((*key).to_string(), (*value).to_string());
        }
        Self::render(template, &merged)
    }
}
