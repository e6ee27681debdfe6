//! The timed test-session engine.
//!
//! A [`TestSession`] is a plain state machine: the host feeds it ticks and
//! user actions and it answers with outcomes. It owns no timer and does no
//! I/O except through the completion sink on a passing submission.
//!
//! ```text
//! InProgress           --tick (time = 0)-->          Finished (forced)
//! InProgress           --submit (all answered)-->    Finished
//! InProgress           --submit (some unanswered)--> AwaitingConfirmation
//! AwaitingConfirmation --confirm-->                  Finished
//! AwaitingConfirmation --cancel-->                   InProgress
//! Finished             --retake-->                   InProgress (reset)
//! ```
//!
//! Every operation is total: called in the wrong phase it returns an
//! `Ignored` outcome (or `false`/`None`) and leaves the state untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::evaluator::{score_with, PassPolicy, ScoreResult, DEFAULT_PASS_THRESHOLD};
use crate::model::{AnswerMap, Question};
use crate::reporter::{CompletionReporter, CompletionSink, ReportOutcome};

/// Default countdown for one attempt, in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 300;

/// Tunables for a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Countdown length for each attempt.
    pub duration_secs: u32,
    /// Inclusive pass threshold in percent.
    pub pass_threshold: f64,
    /// Dismiss an unanswered-question prompt after this many ticks.
    /// `None` keeps it open until the user decides or time runs out.
    pub confirmation_window_secs: Option<u32>,
    /// Below this many seconds the clock is flagged as running low.
    pub low_time_warning_secs: u32,
}

impl SessionConfig {
    /// Reject values that would start a session it cannot finish sensibly.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.duration_secs == 0 || self.duration_secs > DEFAULT_DURATION_SECS {
            return Err(SessionError::InvalidConfig(format!(
                "duration_secs must be between 1 and {DEFAULT_DURATION_SECS}, got {}",
                self.duration_secs
            )));
        }
        if !self.pass_threshold.is_finite() || !(0.0..=100.0).contains(&self.pass_threshold) {
            return Err(SessionError::InvalidConfig(format!(
                "pass_threshold must be a percentage between 0 and 100, got {}",
                self.pass_threshold
            )));
        }
        if self.confirmation_window_secs == Some(0) {
            return Err(SessionError::InvalidConfig(
                "confirmation_window_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            confirmation_window_secs: None,
            low_time_warning_secs: 60,
        }
    }
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InProgress,
    AwaitingConfirmation,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::InProgress => write!(f, "in progress"),
            Phase::AwaitingConfirmation => write!(f, "awaiting confirmation"),
            Phase::Finished => write!(f, "finished"),
        }
    }
}

/// Result of advancing the clock by one second.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Running { seconds_remaining: u32 },
    /// The confirmation prompt timed out; the session is back in progress.
    ConfirmationDismissed { seconds_remaining: u32 },
    /// Time ran out and the session was submitted as-is.
    Expired(ScoreResult),
    Ignored,
}

/// Result of asking to submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Finished(ScoreResult),
    NeedsConfirmation { unanswered: usize },
    Ignored,
}

/// Serializable view of a session for hosts and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub seconds_remaining: u32,
    pub answered: usize,
    pub total: usize,
    pub attempt: u32,
    pub result: Option<ScoreResult>,
}

/// One learner's attempt(s) at a topic's mock test.
pub struct TestSession {
    questions: Vec<Question>,
    config: SessionConfig,
    policy: PassPolicy,
    answers: AnswerMap,
    seconds_remaining: u32,
    phase: Phase,
    attempt: u32,
    confirmation_elapsed: u32,
    last_result: Option<ScoreResult>,
    forced: bool,
    reporter: CompletionReporter,
    sink: Option<Box<dyn CompletionSink>>,
    last_report: Option<ReportOutcome>,
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("questions", &self.questions.len())
            .field("phase", &self.phase)
            .field("seconds_remaining", &self.seconds_remaining)
            .field("answers", &self.answers)
            .field("attempt", &self.attempt)
            .field("last_result", &self.last_result)
            .finish_non_exhaustive()
    }
}

impl TestSession {
    /// Start a session with the default configuration.
    pub fn start(questions: Vec<Question>) -> Result<Self, SessionError> {
        Self::with_config(questions, SessionConfig::default())
    }

    /// Start a session, refusing empty or malformed question sets and
    /// out-of-range config.
    pub fn with_config(
        questions: Vec<Question>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }
        for (index, q) in questions.iter().enumerate() {
            q.check()
                .map_err(|reason| SessionError::MalformedQuestion { index, reason })?;
        }

        tracing::debug!(
            questions = questions.len(),
            duration_secs = config.duration_secs,
            "session started"
        );

        Ok(Self {
            questions,
            policy: PassPolicy::new(config.pass_threshold),
            config,
            answers: AnswerMap::new(),
            seconds_remaining: config.duration_secs,
            phase: Phase::InProgress,
            attempt: 1,
            confirmation_elapsed: 0,
            last_result: None,
            forced: false,
            reporter: CompletionReporter::new(),
            sink: None,
            last_report: None,
        })
    }

    /// Attach the sink that receives passing percentages.
    pub fn with_completion_sink(mut self, sink: impl CompletionSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    // -- transitions --------------------------------------------------------

    /// Record `option` for `question`. Returns `false` when ignored.
    pub fn select_answer(&mut self, question: usize, option: usize) -> bool {
        if self.phase != Phase::InProgress {
            tracing::debug!(question, option, phase = %self.phase, "selection ignored");
            return false;
        }
        let Some(q) = self.questions.get(question) else {
            return false;
        };
        if option >= q.options.len() {
            return false;
        }
        self.answers.select(question, option);
        true
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase == Phase::Finished {
            return TickOutcome::Ignored;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            tracing::info!(unanswered = self.unanswered_count(), "time expired, submitting");
            return TickOutcome::Expired(self.finish(true));
        }

        if self.phase == Phase::AwaitingConfirmation {
            self.confirmation_elapsed += 1;
            if let Some(window) = self.config.confirmation_window_secs {
                if self.confirmation_elapsed >= window {
                    self.phase = Phase::InProgress;
                    self.confirmation_elapsed = 0;
                    tracing::debug!("confirmation prompt dismissed");
                    return TickOutcome::ConfirmationDismissed {
                        seconds_remaining: self.seconds_remaining,
                    };
                }
            }
        }

        TickOutcome::Running {
            seconds_remaining: self.seconds_remaining,
        }
    }

    /// Ask to submit; unanswered questions require confirmation first.
    pub fn request_submit(&mut self) -> SubmitOutcome {
        if self.phase != Phase::InProgress {
            return SubmitOutcome::Ignored;
        }

        let unanswered = self.unanswered_count();
        if unanswered == 0 {
            return SubmitOutcome::Finished(self.finish(false));
        }

        self.phase = Phase::AwaitingConfirmation;
        self.confirmation_elapsed = 0;
        tracing::debug!(unanswered, "submission needs confirmation");
        SubmitOutcome::NeedsConfirmation { unanswered }
    }

    /// Submit despite unanswered questions.
    pub fn confirm_submit(&mut self) -> Option<ScoreResult> {
        if self.phase != Phase::AwaitingConfirmation {
            return None;
        }
        Some(self.finish(false))
    }

    /// Go back to answering; answers and elapsed time are kept.
    pub fn cancel_submit(&mut self) -> bool {
        if self.phase != Phase::AwaitingConfirmation {
            return false;
        }
        self.phase = Phase::InProgress;
        self.confirmation_elapsed = 0;
        true
    }

    /// Reset a finished session for another attempt at the same questions.
    pub fn retake(&mut self) -> bool {
        if self.phase != Phase::Finished {
            return false;
        }
        self.answers.clear();
        self.seconds_remaining = self.config.duration_secs;
        self.phase = Phase::InProgress;
        self.confirmation_elapsed = 0;
        self.last_result = None;
        self.forced = false;
        self.last_report = None;
        self.reporter.reset();
        self.attempt += 1;
        tracing::debug!(attempt = self.attempt, "session retaken");
        true
    }

    fn finish(&mut self, forced: bool) -> ScoreResult {
        let result = score_with(&self.policy, &self.questions, &self.answers);
        self.phase = Phase::Finished;
        self.confirmation_elapsed = 0;
        self.forced = forced;
        self.last_result = Some(result);

        let outcome = match self.sink.as_mut() {
            Some(sink) => self.reporter.report_if_passed(&result, &mut **sink),
            None => self.reporter.report_if_passed(&result, &mut |_: f64| {}),
        };
        self.last_report = Some(outcome);

        tracing::info!(
            percentage = result.percentage,
            passed = result.passed,
            forced,
            attempt = self.attempt,
            "session finished"
        );
        result
    }

    // -- views --------------------------------------------------------------

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn unanswered_count(&self) -> usize {
        self.questions.len() - self.answers.len()
    }

    /// Fraction of questions answered, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.answers.len() as f64 / self.questions.len() as f64
    }

    pub fn is_time_low(&self) -> bool {
        self.phase != Phase::Finished
            && self.seconds_remaining < self.config.low_time_warning_secs
    }

    pub fn last_result(&self) -> Option<ScoreResult> {
        self.last_result
    }

    /// Whether the last submission was forced by the countdown.
    pub fn was_forced(&self) -> bool {
        self.forced
    }

    /// How the last finished attempt was reported, if it finished.
    pub fn last_report(&self) -> Option<&ReportOutcome> {
        self.last_report.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            answered: self.answers.len(),
            total: self.questions.len(),
            attempt: self.attempt,
            result: self.last_result,
        }
    }
}

/// Render seconds as `m:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question::new(&format!("Question {i}"), ["a", "b", "c", "d"], i % 4))
            .collect()
    }

    fn answer_correctly(session: &mut TestSession, range: std::ops::Range<usize>) {
        for i in range {
            assert!(session.select_answer(i, i % 4));
        }
    }

    #[test]
    fn start_initial_state() {
        let session = TestSession::start(questions(10)).unwrap();
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.seconds_remaining(), 300);
        assert!(session.answers().is_empty());
        assert_eq!(session.attempt(), 1);
        assert!(session.last_result().is_none());
    }

    #[test]
    fn start_rejects_empty_set() {
        let err = TestSession::start(vec![]).unwrap_err();
        assert_eq!(err, SessionError::EmptyQuestionSet);
    }

    #[test]
    fn start_rejects_malformed_question() {
        let mut qs = questions(3);
        qs[1].correct_option_index = 7;
        let err = TestSession::start(qs).unwrap_err();
        assert!(matches!(err, SessionError::MalformedQuestion { index: 1, .. }));
    }

    #[test]
    fn start_rejects_zero_duration() {
        let config = SessionConfig {
            duration_secs: 0,
            ..SessionConfig::default()
        };
        let err = TestSession::with_config(questions(3), config).unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn start_rejects_duration_above_five_minutes() {
        let config = SessionConfig {
            duration_secs: 100_000,
            ..SessionConfig::default()
        };
        let err = TestSession::with_config(questions(3), config).unwrap_err();
        assert!(err.to_string().contains("between 1 and 300"));
    }

    #[test]
    fn start_rejects_unusable_threshold() {
        for threshold in [f64::NAN, f64::INFINITY, -1.0, 100.5] {
            let config = SessionConfig {
                pass_threshold: threshold,
                ..SessionConfig::default()
            };
            let result = TestSession::with_config(questions(3), config);
            assert!(
                matches!(result, Err(SessionError::InvalidConfig(_))),
                "threshold {threshold} was accepted"
            );
        }
    }

    #[test]
    fn start_rejects_empty_confirmation_window() {
        let config = SessionConfig {
            confirmation_window_secs: Some(0),
            ..SessionConfig::default()
        };
        assert!(TestSession::with_config(questions(3), config).is_err());
    }

    #[test]
    fn boundary_config_is_accepted() {
        let config = SessionConfig {
            duration_secs: 1,
            pass_threshold: 100.0,
            ..SessionConfig::default()
        };
        let mut session = TestSession::with_config(questions(2), config).unwrap();
        assert_eq!(session.seconds_remaining(), 1);
        assert!(matches!(session.tick(), TickOutcome::Expired(_)));
    }

    #[test]
    fn select_is_idempotent_and_overwrites() {
        let mut session = TestSession::start(questions(3)).unwrap();
        session.select_answer(0, 2);
        let once = session.answers().clone();
        session.select_answer(0, 2);
        assert_eq!(session.answers(), &once);

        session.select_answer(0, 1);
        assert_eq!(session.answers().get(0), Some(1));
        assert_eq!(session.answers().len(), 1);
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut session = TestSession::start(questions(3)).unwrap();
        assert!(!session.select_answer(3, 0));
        assert!(!session.select_answer(0, 4));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn tick_decrements_by_one() {
        let mut session = TestSession::start(questions(2)).unwrap();
        let mut previous = session.seconds_remaining();
        for _ in 0..299 {
            match session.tick() {
                TickOutcome::Running { seconds_remaining } => {
                    assert_eq!(seconds_remaining, previous - 1);
                    previous = seconds_remaining;
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(session.seconds_remaining(), 1);
    }

    #[test]
    fn timeout_forces_zero_score() {
        let mut session = TestSession::start(questions(10)).unwrap();
        let mut expired = None;
        for _ in 0..300 {
            if let TickOutcome::Expired(result) = session.tick() {
                expired = Some(result);
            }
        }
        let result = expired.expect("session should expire on the 300th tick");
        assert_eq!(result.percentage, 0.0);
        assert!(!result.passed);
        assert_eq!(session.phase(), Phase::Finished);
        assert_eq!(session.seconds_remaining(), 0);
        assert!(session.was_forced());

        // Stray ticks after expiry change nothing.
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(session.seconds_remaining(), 0);
    }

    #[test]
    fn timeout_bypasses_confirmation() {
        let config = SessionConfig {
            duration_secs: 3,
            ..SessionConfig::default()
        };
        let mut session = TestSession::with_config(questions(4), config).unwrap();
        answer_correctly(&mut session, 0..3);
        assert_eq!(
            session.request_submit(),
            SubmitOutcome::NeedsConfirmation { unanswered: 1 }
        );

        // The countdown keeps running while the prompt is open.
        assert_eq!(
            session.tick(),
            TickOutcome::Running {
                seconds_remaining: 2
            }
        );
        session.tick();
        match session.tick() {
            TickOutcome::Expired(result) => assert_eq!(result.percentage, 75.0),
            other => panic!("expected expiry, got {other:?}"),
        }
    }

    #[test]
    fn full_credit_reports_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let calls = calls.clone();
            let seen = seen.clone();
            move |p: f64| {
                calls.fetch_add(1, Ordering::SeqCst);
                seen.lock().unwrap().push(p);
            }
        };
        let mut session = TestSession::start(questions(10))
            .unwrap()
            .with_completion_sink(sink);

        answer_correctly(&mut session, 0..10);
        let outcome = session.request_submit();
        match outcome {
            SubmitOutcome::Finished(result) => {
                assert_eq!(result.percentage, 100.0);
                assert!(result.passed);
            }
            other => panic!("expected finish, got {other:?}"),
        }

        // Later stray events must not re-report.
        assert_eq!(session.request_submit(), SubmitOutcome::Ignored);
        assert_eq!(session.tick(), TickOutcome::Ignored);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![100.0]);
        assert_eq!(session.last_report(), Some(&ReportOutcome::Reported));
    }

    #[test]
    fn partial_confirmation_flow() {
        let mut session = TestSession::start(questions(10)).unwrap();
        answer_correctly(&mut session, 0..7);
        for _ in 0..42 {
            session.tick();
        }

        assert_eq!(
            session.request_submit(),
            SubmitOutcome::NeedsConfirmation { unanswered: 3 }
        );
        assert_eq!(session.phase(), Phase::AwaitingConfirmation);

        // Selections are not accepted while the prompt is open.
        assert!(!session.select_answer(8, 0));

        assert!(session.cancel_submit());
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.answers().len(), 7);
        assert_eq!(session.seconds_remaining(), 258);

        session.request_submit();
        let result = session.confirm_submit().unwrap();
        assert_eq!(result.percentage, 70.0);
        assert!(result.passed);
        assert!(!session.was_forced());
    }

    #[test]
    fn confirm_and_cancel_outside_prompt_are_ignored() {
        let mut session = TestSession::start(questions(2)).unwrap();
        assert!(session.confirm_submit().is_none());
        assert!(!session.cancel_submit());
        assert!(!session.retake());
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn confirmation_window_dismisses_prompt() {
        let config = SessionConfig {
            confirmation_window_secs: Some(5),
            ..SessionConfig::default()
        };
        let mut session = TestSession::with_config(questions(2), config).unwrap();
        session.request_submit();
        for _ in 0..4 {
            assert!(matches!(session.tick(), TickOutcome::Running { .. }));
        }
        assert_eq!(
            session.tick(),
            TickOutcome::ConfirmationDismissed {
                seconds_remaining: 295
            }
        );
        assert_eq!(session.phase(), Phase::InProgress);
    }

    #[test]
    fn retake_resets_state() {
        let mut count = 0u32;
        let counter = Arc::new(AtomicU32::new(0));
        let sink = {
            let counter = counter.clone();
            move |_: f64| {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        };
        let mut session = TestSession::start(questions(5))
            .unwrap()
            .with_completion_sink(sink);

        answer_correctly(&mut session, 0..5);
        session.tick();
        session.request_submit();
        count += 1;

        assert!(session.retake());
        assert_eq!(session.seconds_remaining(), 300);
        assert!(session.answers().is_empty());
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.attempt(), 2);
        assert!(session.last_result().is_none());

        // A second pass reports again after the retake.
        answer_correctly(&mut session, 0..5);
        session.request_submit();
        count += 1;
        assert_eq!(counter.load(Ordering::SeqCst), count);
    }

    #[test]
    fn failing_attempt_does_not_report() {
        let counter = Arc::new(AtomicU32::new(0));
        let sink = {
            let counter = counter.clone();
            move |_: f64| {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        };
        let mut session = TestSession::start(questions(10))
            .unwrap()
            .with_completion_sink(sink);
        answer_correctly(&mut session, 0..5);
        session.request_submit();
        let result = session.confirm_submit().unwrap();
        assert_eq!(result.percentage, 50.0);
        assert!(!result.passed);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(session.last_report(), Some(&ReportOutcome::NotPassed));
    }

    #[test]
    fn custom_threshold_applies() {
        let config = SessionConfig {
            pass_threshold: 80.0,
            ..SessionConfig::default()
        };
        let mut session = TestSession::with_config(questions(10), config).unwrap();
        answer_correctly(&mut session, 0..7);
        session.request_submit();
        assert!(!session.confirm_submit().unwrap().passed);
    }

    #[test]
    fn views_track_progress() {
        let mut session = TestSession::start(questions(4)).unwrap();
        answer_correctly(&mut session, 0..1);
        assert_eq!(session.progress(), 0.25);
        assert_eq!(session.unanswered_count(), 3);
        assert!(!session.is_time_low());

        for _ in 0..241 {
            session.tick();
        }
        assert_eq!(session.seconds_remaining(), 59);
        assert!(session.is_time_low());

        let snap = session.snapshot();
        assert_eq!(snap.answered, 1);
        assert_eq!(snap.total, 4);
        assert_eq!(snap.phase, Phase::InProgress);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(300), "5:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(9), "0:09");
    }

    #[test]
    fn config_fills_missing_fields() {
        let config: SessionConfig = serde_json::from_str(r#"{"duration_secs": 120}"#).unwrap();
        assert_eq!(config.duration_secs, 120);
        assert_eq!(config.pass_threshold, 60.0);
        assert!(config.confirmation_window_secs.is_none());
    }
}
