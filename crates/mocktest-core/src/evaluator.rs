//! Scoring and pass/fail policy.
//!
//! Scoring is a pure function of the question set and the answer map, so
//! both the forced (timeout) and the confirmed submission paths share it.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerMap, Question};

/// Default pass threshold in percent, inclusive.
pub const DEFAULT_PASS_THRESHOLD: f64 = 60.0;

/// Outcome of scoring one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Share of correctly answered questions, in `[0, 100]`.
    pub percentage: f64,
    pub passed: bool,
    /// Number of correctly answered questions.
    pub correct: usize,
    /// Number of questions in the set.
    pub total: usize,
}

/// Decides whether a percentage is a pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassPolicy {
    pub threshold: f64,
}

impl Default for PassPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

impl PassPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn passes(&self, percentage: f64) -> bool {
        percentage >= self.threshold
    }
}

/// Score answers against the default 60% policy.
pub fn score(questions: &[Question], answers: &AnswerMap) -> ScoreResult {
    score_with(&PassPolicy::default(), questions, answers)
}

/// Score answers against an explicit policy.
///
/// A question counts only when the map holds its exact index and the
/// selected option equals the correct one; unanswered questions count as
/// wrong. An empty question set scores 0% (callers must not start a
/// session without questions).
pub fn score_with(policy: &PassPolicy, questions: &[Question], answers: &AnswerMap) -> ScoreResult {
    let total = questions.len();
    let correct = questions
        .iter()
        .enumerate()
        .filter(|(idx, q)| answers.get(*idx).is_some_and(|o| q.is_correct(o)))
        .count();

    let percentage = if total == 0 {
        0.0
    } else {
        100.0 * correct as f64 / total as f64
    };

    ScoreResult {
        percentage,
        passed: policy.passes(percentage),
        correct,
        total,
    }
}
