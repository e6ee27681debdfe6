//! The `mocktest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use mocktest_core::parser::{load_question_file, validate_question_set};

pub fn execute(path: PathBuf) -> Result<()> {
    let questions = load_question_file(&path)?;
    println!(
        "Question set: {} ({} questions)",
        path.display(),
        questions.len()
    );

    let warnings = validate_question_set(&questions);
    for w in &warnings {
        let prefix = w
            .question
            .map(|idx| format!("  [{}]", idx + 1))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Question set valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
