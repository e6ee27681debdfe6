//! Error types shared across the mocktest crates.
//!
//! `ProviderError` lives here rather than in `mocktest-providers` so the
//! study planner can downcast and classify failures for retry decisions
//! without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with a text-generation backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The backend answered with no text at all.
    #[error("empty response from API")]
    EmptyResponse,
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Reasons a test session refuses to start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("question set is empty")]
    EmptyQuestionSet,

    #[error("question {index} is malformed: {reason}")]
    MalformedQuestion { index: usize, reason: String },

    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

/// Failures turning generated text into structured data.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No `[ ... ]` array could be located in the text.
    #[error("invalid JSON structure in response")]
    MissingArray,

    #[error("failed to parse API response: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures reading or updating the course catalog.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("course not found: {0}")]
    CourseNotFound(String),

    #[error("topic {topic_id} not found in course {course_id}")]
    TopicNotFound { course_id: String, topic_id: u32 },

    #[error("failed to access course store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode course store: {0}")]
    Json(#[from] serde_json::Error),
}
