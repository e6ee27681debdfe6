//! Completion reporting.
//!
//! The reporter is the only place a session writes to the outside world:
//! a passing score is handed to a [`CompletionSink`] at most once per
//! attempt.

use std::sync::Arc;

use uuid::Uuid;

use crate::evaluator::ScoreResult;
use crate::traits::ProgressStore;

/// Receives the percentage of a passing attempt.
pub trait CompletionSink: Send {
    fn on_pass(&mut self, percentage: f64) -> anyhow::Result<()>;
}

impl<F> CompletionSink for F
where
    F: FnMut(f64) + Send,
{
    fn on_pass(&mut self, percentage: f64) -> anyhow::Result<()> {
        self(percentage);
        Ok(())
    }
}

/// Forwards passing scores to a progress store for one course topic.
pub struct ProgressSink {
    store: Arc<dyn ProgressStore>,
    course_id: Uuid,
    topic_id: u32,
}

impl ProgressSink {
    pub fn new(store: Arc<dyn ProgressStore>, course_id: Uuid, topic_id: u32) -> Self {
        Self {
            store,
            course_id,
            topic_id,
        }
    }
}

impl CompletionSink for ProgressSink {
    fn on_pass(&mut self, percentage: f64) -> anyhow::Result<()> {
        self.store
            .record_completion(self.course_id, self.topic_id, percentage)?;
        Ok(())
    }
}

/// What happened when a result was offered to the reporter.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// The sink received the percentage.
    Reported,
    /// The result did not pass; nothing was sent.
    NotPassed,
    /// This attempt already reported once.
    AlreadyReported,
    /// The sink was invoked but failed.
    Failed(String),
}

/// Guards the at-most-once delivery of a passing score.
#[derive(Debug, Default)]
pub struct CompletionReporter {
    reported: bool,
}

impl CompletionReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_reported(&self) -> bool {
        self.reported
    }

    /// Hand `result` to `sink` if it passed and nothing was reported yet.
    ///
    /// A failing sink still counts as the single delivery attempt.
    pub fn report_if_passed(
        &mut self,
        result: &ScoreResult,
        sink: &mut dyn CompletionSink,
    ) -> ReportOutcome {
        if !result.passed {
            return ReportOutcome::NotPassed;
        }
        if self.reported {
            return ReportOutcome::AlreadyReported;
        }
        self.reported = true;

        match sink.on_pass(result.percentage) {
            Ok(()) => {
                tracing::info!(percentage = result.percentage, "completion reported");
                ReportOutcome::Reported
            }
            Err(e) => {
                tracing::error!("failed to record completion: {e:#}");
                ReportOutcome::Failed(format!("{e:#}"))
            }
        }
    }

    /// Allow the next passing attempt to report again.
    pub fn reset(&mut self) {
        self.reported = false;
    }
}
