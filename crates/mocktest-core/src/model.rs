//! Core data model types for mocktest.
//!
//! Questions and answers feed the session engine; courses and topics are
//! what the progress store tracks between sessions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every question offers exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// A single multiple-choice question.
///
/// Field names on the wire follow the generator's format
/// (`question`, `options`, `correctAnswer`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question prompt.
    #[serde(rename = "question", alias = "text")]
    pub text: String,
    /// Answer options, in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    #[serde(rename = "correctAnswer", alias = "correct_option_index")]
    pub correct_option_index: usize,
}

impl Question {
    pub fn new(text: &str, options: [&str; OPTIONS_PER_QUESTION], correct: usize) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option_index: correct,
        }
    }

    /// Check the structural rules a session relies on.
    pub fn check(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("question text is empty".into());
        }
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "expected {OPTIONS_PER_QUESTION} options, found {}",
                self.options.len()
            ));
        }
        if self.correct_option_index >= OPTIONS_PER_QUESTION {
            return Err(format!(
                "correct option index {} is out of range",
                self.correct_option_index
            ));
        }
        Ok(())
    }

    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option_index
    }
}

/// Selected option per question index.
///
/// Entries are only ever added or overwritten while a session runs; the
/// map is cleared as a whole when a session is retaken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, usize>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `option` for `question`, returning the previous selection.
    pub fn select(&mut self, question: usize, option: usize) -> Option<usize> {
        self.0.insert(question, option)
    }

    pub fn get(&self, question: usize) -> Option<usize> {
        self.0.get(&question).copied()
    }

    pub fn contains(&self, question: usize) -> bool {
        self.0.contains_key(&question)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.iter().map(|(q, o)| (*q, *o))
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<(usize, usize)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Course difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Beginner => write!(f, "beginner"),
            Level::Intermediate => write!(f, "intermediate"),
            Level::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// A topic as produced by the generator, before it joins a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// A unit of course content gated by a mock test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Position-derived identifier, stable for the life of the course.
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Set once a passing test has been recorded.
    #[serde(default)]
    pub completed: bool,
    /// Percentage of the passing attempt.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A user-created course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub level: Level,
    #[serde(default)]
    pub topics: Vec<Topic>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn new(name: &str, level: Level) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            level,
            topics: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn topic(&self, topic_id: u32) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    pub fn topic_mut(&mut self, topic_id: u32) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|t| t.id == topic_id)
    }

    /// Percentage of topics completed, 0 when the course has none yet.
    pub fn progress(&self) -> f64 {
        if self.topics.is_empty() {
            return 0.0;
        }
        let done = self.topics.iter().filter(|t| t.completed).count();
        100.0 * done as f64 / self.topics.len() as f64
    }
}
