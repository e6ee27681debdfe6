//! The `mocktest init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("mocktest.toml").exists() {
        println!("mocktest.toml already exists, skipping.");
    } else {
        std::fs::write("mocktest.toml", SAMPLE_CONFIG)?;
        println!("Created mocktest.toml");
    }

    std::fs::create_dir_all("question-sets")?;
    let sample_path = Path::new("question-sets/sample.json");
    if sample_path.exists() {
        println!("question-sets/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_QUESTIONS)?;
        println!("Created question-sets/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Set MOCKTEST_GEMINI_KEY or edit mocktest.toml with your API keys");
    println!("  2. Run: mocktest course new --name Rust --level beginner");
    println!("  3. Run: mocktest take --course Rust --topic 0");
    println!("     (or offline: mocktest take --course Rust --topic 0 --questions question-sets/sample.json)");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# mocktest configuration

default_provider = "gemini"
default_model = "gemini-pro"
default_temperature = 0.7
question_count = 10
topic_count = 5
store_path = "./mocktest-courses.json"

[providers.gemini]
type = "gemini"
api_key = "${GEMINI_API_KEY}"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[session]
duration_secs = 300
pass_threshold = 60.0
low_time_warning_secs = 60
# Close the "submit anyway?" prompt after this many seconds.
# confirmation_window_secs = 3
"#;

const SAMPLE_QUESTIONS: &str = r#"[
  {
    "question": "Which keyword makes a binding mutable?",
    "options": ["var", "mut", "let", "static"],
    "correctAnswer": 1
  },
  {
    "question": "What happens to a String when it is assigned to another variable?",
    "options": ["It is copied", "It is cloned", "It is moved", "It is borrowed"],
    "correctAnswer": 2
  },
  {
    "question": "How many mutable references to a value may exist at once?",
    "options": ["One", "Two", "Any number", "None"],
    "correctAnswer": 0
  },
  {
    "question": "Which type represents an optional value?",
    "options": ["Result", "Box", "Option", "Cell"],
    "correctAnswer": 2
  },
  {
    "question": "Which operator propagates an error to the caller?",
    "options": ["!", "?", "&", "*"],
    "correctAnswer": 1
  }
]
"#;
