//! Parsing generated text into questions and topics.
//!
//! Generators are asked for a bare JSON array but routinely wrap it in prose
//! or markdown fences, so parsing starts by cutting the text down to the
//! span between the first `[` and the last `]`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::error::ParseError;
use crate::model::{Question, TopicDraft};

/// Locate the outermost JSON array in `text`.
pub fn extract_json_array(text: &str) -> Result<&str, ParseError> {
    let start = text.find('[').ok_or(ParseError::MissingArray)?;
    let end = text.rfind(']').ok_or(ParseError::MissingArray)?;
    if end < start {
        return Err(ParseError::MissingArray);
    }
    Ok(&text[start..=end])
}

fn parse_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, ParseError> {
    let json = extract_json_array(text)?;
    Ok(serde_json::from_str(json)?)
}

/// Parse a generator response into questions.
pub fn parse_questions(text: &str) -> Result<Vec<Question>, ParseError> {
    parse_array(text)
}

/// Parse a generator response into topic drafts.
pub fn parse_topics(text: &str) -> Result<Vec<TopicDraft>, ParseError> {
    parse_array(text)
}

/// Load a question set from a JSON file.
pub fn load_question_file(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file: {}", path.display()))?;
    parse_questions(&content)
        .with_context(|| format!("failed to parse question file: {}", path.display()))
}

/// A warning from question set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Zero-based question index (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Validate a question set for issues that would break or weaken a test.
pub fn validate_question_set(questions: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if questions.is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "question set is empty".into(),
        });
        return warnings;
    }

    for (idx, q) in questions.iter().enumerate() {
        if let Err(reason) = q.check() {
            warnings.push(ValidationWarning {
                question: Some(idx),
                message: reason,
            });
        }
    }

    // Duplicate prompts
    let mut seen = HashSet::new();
    for (idx, q) in questions.iter().enumerate() {
        let key = q.text.trim().to_lowercase();
        if !key.is_empty() && !seen.insert(key) {
            warnings.push(ValidationWarning {
                question: Some(idx),
                message: format!("duplicate question: {}", q.text.trim()),
            });
        }
    }

    // Repeated options make the question ambiguous
    for (idx, q) in questions.iter().enumerate() {
        let distinct: HashSet<_> = q.options.iter().map(|o| o.trim().to_lowercase()).collect();
        if distinct.len() < q.options.len() {
            warnings.push(ValidationWarning {
                question: Some(idx),
                message: "options are not distinct".into(),
            });
        }
    }

    warnings
}
