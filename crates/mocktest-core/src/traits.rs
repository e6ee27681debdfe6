//! Collaborator traits.
//!
//! Text generation and question/topic sourcing are async and implemented by
//! `mocktest-providers`. Progress storage is synchronous because it is
//! called from inside a session transition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Level, Question, TopicDraft};

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

/// Trait for LLM backends that turn a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate text from a prompt.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List models known to this backend.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to generate text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "gemini-pro").
    pub model: String,
    /// The main prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a text generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response text.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Backend name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Study content sources
// ---------------------------------------------------------------------------

/// Supplies the questions for one topic's mock test.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch_questions(&self, topic_title: &str) -> anyhow::Result<Vec<Question>>;
}

/// Plans the topic list of a new course.
#[async_trait]
pub trait TopicPlanner: Send + Sync {
    async fn generate_topics(&self, course: &str, level: Level) -> anyhow::Result<Vec<TopicDraft>>;
}

// ---------------------------------------------------------------------------
// Progress tracking
// ---------------------------------------------------------------------------

/// Records that a topic's test was passed.
pub trait ProgressStore: Send + Sync {
    fn record_completion(
        &self,
        course_id: Uuid,
        topic_id: u32,
        percentage: f64,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Default system prompt for study-content generation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a study assistant that writes course material. Respond ONLY with the JSON requested. Do not add explanations or markdown outside the JSON.";

/// Prompt asking for `count` multiple-choice questions about `topic`.
pub fn question_prompt(topic: &str, count: usize) -> String {
    format!(
        "Generate a mock test for \"{topic}\".\n\
         Return ONLY a JSON array with exactly {count} questions in this format:\n\
         [{{\"question\": \"Question text\", \"options\": [\"Option 1\", \"Option 2\", \"Option 3\", \"Option 4\"], \"correctAnswer\": 0}}]\n\
         where correctAnswer is the index (0-3) of the correct option."
    )
}

/// Prompt asking for a learning path of `count` topics.
pub fn topic_prompt(course: &str, level: Level, count: usize) -> String {
    format!(
        "Generate a structured learning path for {course} at {level} level.\n\
         Return ONLY a JSON array with exactly {count} topics in this format:\n\
         [{{\"title\": \"Topic Name\", \"description\": \"Brief topic description\"}}]"
    )
}
