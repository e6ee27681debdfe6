//! mocktest-providers: text-generation backends and study planning.
//!
//! Implements the `TextGenerator` trait for Gemini, Anthropic, and Ollama,
//! and builds question sets and learning paths on top of any of them.

use std::time::Duration;

pub mod anthropic;
pub mod config;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod planner;

pub use config::{create_provider, load_config, load_config_from, MocktestConfig, ProviderConfig};
pub use mocktest_core::error::ProviderError;
pub use planner::{LlmStudyPlanner, PlannerConfig};

/// HTTP client shared by the hosted backends.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
