//! Study content generated by a text backend.
//!
//! [`LlmStudyPlanner`] turns a course name into a learning path and a
//! topic title into a mock test, retrying transient backend failures.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;

use mocktest_core::model::{Level, Question, TopicDraft};
use mocktest_core::parser::{parse_questions, parse_topics};
use mocktest_core::traits::{
    question_prompt, topic_prompt, GenerateRequest, QuestionSource, TextGenerator, TopicPlanner,
};

use crate::config::MocktestConfig;
use crate::ProviderError;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Knobs for content generation.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub question_count: usize,
    pub topic_count: usize,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Retries after the first attempt on transient errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time up to a minute.
    pub retry_delay: Duration,
    pub system_prompt_override: Option<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            question_count: 10,
            topic_count: 5,
            temperature: 0.7,
            max_tokens: 4096,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            system_prompt_override: None,
        }
    }
}

impl From<&MocktestConfig> for PlannerConfig {
    fn from(config: &MocktestConfig) -> Self {
        Self {
            question_count: config.question_count,
            topic_count: config.topic_count,
            temperature: config.default_temperature,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            ..Self::default()
        }
    }
}

/// Question source and topic planner backed by any [`TextGenerator`].
pub struct LlmStudyPlanner {
    generator: Arc<dyn TextGenerator>,
    model: String,
    config: PlannerConfig,
}

impl LlmStudyPlanner {
    pub fn new(generator: Arc<dyn TextGenerator>, model: &str, config: PlannerConfig) -> Self {
        Self {
            generator,
            model: model.to_string(),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Send `prompt`, retrying transient failures with exponential backoff.
    async fn generate_with_retry(&self, prompt: String) -> anyhow::Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            system_prompt: self.config.system_prompt_override.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;
        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tracing::warn!(retry, delay = ?retry_delay, "retrying generation");
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.generator.generate(&request).await {
                Ok(response) => {
                    tracing::debug!(
                        provider = self.generator.name(),
                        tokens = response.token_usage.total_tokens,
                        latency_ms = response.latency_ms,
                        "generation complete"
                    );
                    return Ok(response.content);
                }
                Err(e) => {
                    if let Some(provider_err) = e.downcast_ref::<ProviderError>() {
                        if provider_err.is_permanent() {
                            return Err(e);
                        }
                        if let Some(ms) = provider_err.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms);
                        }
                    }
                    tracing::warn!(error = %e, "generation failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("generation was never attempted")))
    }
}

#[async_trait]
impl QuestionSource for LlmStudyPlanner {
    #[instrument(skip(self), fields(model = %self.model))]
    async fn fetch_questions(&self, topic_title: &str) -> anyhow::Result<Vec<Question>> {
        let wanted = self.config.question_count;
        let text = self
            .generate_with_retry(question_prompt(topic_title, wanted))
            .await
            .context("failed to generate questions")?;
        let parsed = parse_questions(&text).context("failed to generate questions")?;

        let questions: Vec<Question> = parsed
            .into_iter()
            .enumerate()
            .filter_map(|(i, q)| match q.check() {
                Ok(()) => Some(q),
                Err(reason) => {
                    tracing::warn!(index = i, %reason, "dropping malformed question");
                    None
                }
            })
            .collect();

        if questions.is_empty() {
            anyhow::bail!("failed to generate questions: no usable questions for \"{topic_title}\"");
        }
        if questions.len() != wanted {
            tracing::warn!(wanted, got = questions.len(), "question count differs from request");
        }
        Ok(questions)
    }
}

#[async_trait]
impl TopicPlanner for LlmStudyPlanner {
    #[instrument(skip(self), fields(model = %self.model))]
    async fn generate_topics(&self, course: &str, level: Level) -> anyhow::Result<Vec<TopicDraft>> {
        let wanted = self.config.topic_count;
        let text = self
            .generate_with_retry(topic_prompt(course, level, wanted))
            .await
            .context("failed to generate topics")?;
        let topics: Vec<TopicDraft> = parse_topics(&text)
            .context("failed to generate topics")?
            .into_iter()
            .filter(|t| !t.title.trim().is_empty())
            .collect();

        if topics.is_empty() {
            anyhow::bail!("failed to generate topics: empty learning path for \"{course}\"");
        }
        if topics.len() != wanted {
            tracing::warn!(wanted, got = topics.len(), "topic count differs from request");
        }
        Ok(topics)
    }
}
