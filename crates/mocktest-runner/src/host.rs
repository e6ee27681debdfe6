//! The session host: one task, one timer, one session.

use std::time::Duration;

use tokio::sync::mpsc;

use mocktest_core::engine::{Phase, SessionSnapshot, SubmitOutcome, TestSession, TickOutcome};
use mocktest_core::evaluator::ScoreResult;
use mocktest_core::reporter::ReportOutcome;

use crate::timer::SessionTimer;

/// A user action forwarded to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Select { question: usize, option: usize },
    Submit,
    Confirm,
    Cancel,
    Retake,
    Snapshot,
    Quit,
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::Select { .. } => "select",
            SessionCommand::Submit => "submit",
            SessionCommand::Confirm => "confirm",
            SessionCommand::Cancel => "cancel",
            SessionCommand::Retake => "retake",
            SessionCommand::Snapshot => "snapshot",
            SessionCommand::Quit => "quit",
        }
    }
}

/// Something the host wants the front end to show.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Tick {
        seconds_remaining: u32,
        time_low: bool,
    },
    AnswerRecorded {
        question: usize,
        option: usize,
        answered: usize,
        total: usize,
    },
    ConfirmationRequired {
        unanswered: usize,
    },
    /// The unanswered-question prompt closed without submitting.
    ConfirmationDismissed {
        seconds_remaining: u32,
    },
    Finished {
        result: ScoreResult,
        /// Time ran out rather than the learner submitting.
        forced: bool,
        report: Option<ReportOutcome>,
    },
    Restarted {
        attempt: u32,
        seconds_remaining: u32,
    },
    Snapshot(SessionSnapshot),
    /// The command does not apply in the current phase.
    Ignored {
        command: &'static str,
        phase: Phase,
    },
}

/// What a finished [`SessionHost::run`] leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSummary {
    pub attempts: u32,
    pub last_result: Option<ScoreResult>,
    /// Whether any attempt handed a pass to the completion sink.
    pub completion_reported: bool,
}

/// Owns a session and its timer for the lifetime of one `run`.
#[derive(Debug)]
pub struct SessionHost {
    session: TestSession,
    tick_period: Duration,
    timer: Option<SessionTimer>,
    completion_reported: bool,
}

impl SessionHost {
    pub fn new(session: TestSession) -> Self {
        Self {
            session,
            tick_period: Duration::from_secs(1),
            timer: None,
            completion_reported: false,
        }
    }

    /// Override the 1 s tick period.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub fn session(&self) -> &TestSession {
        &self.session
    }

    pub fn timer_active(&self) -> bool {
        self.timer.as_ref().is_some_and(SessionTimer::is_active)
    }

    /// Drive the session until `Quit` arrives or `commands` closes.
    ///
    /// The timer runs only while the session is unfinished and is released
    /// on every exit path.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::Sender<SessionEvent>,
    ) -> HostSummary {
        if !self.session.is_finished() {
            self.start_timer();
        }
        tracing::info!(
            questions = self.session.questions().len(),
            seconds = self.session.seconds_remaining(),
            "session host running"
        );

        loop {
            tokio::select! {
                () = next_tick(&mut self.timer) => {
                    let event = self.on_tick();
                    if let Some(event) = event {
                        emit(&events, event).await;
                    }
                }
                command = commands.recv() => match command {
                    None => break,
                    Some(command) => match self.apply(command) {
                        Some(event) => emit(&events, event).await,
                        None => break,
                    },
                },
            }
        }

        self.stop_timer();
        let summary = HostSummary {
            attempts: self.session.attempt(),
            last_result: self.session.last_result(),
            completion_reported: self.completion_reported,
        };
        tracing::info!(
            attempts = summary.attempts,
            reported = summary.completion_reported,
            "session closed"
        );
        summary
    }

    fn start_timer(&mut self) {
        self.timer = Some(SessionTimer::start(self.tick_period));
    }

    fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn on_tick(&mut self) -> Option<SessionEvent> {
        match self.session.tick() {
            TickOutcome::Running { seconds_remaining } => Some(SessionEvent::Tick {
                seconds_remaining,
                time_low: self.session.is_time_low(),
            }),
            TickOutcome::ConfirmationDismissed { seconds_remaining } => {
                Some(SessionEvent::ConfirmationDismissed { seconds_remaining })
            }
            TickOutcome::Expired(result) => Some(self.finished(result)),
            TickOutcome::Ignored => {
                // A tick raced the finish; the timer is already on its way out.
                self.stop_timer();
                None
            }
        }
    }

    /// Apply one command; `None` means the learner quit.
    fn apply(&mut self, command: SessionCommand) -> Option<SessionEvent> {
        let ignored = SessionEvent::Ignored {
            command: command.name(),
            phase: self.session.phase(),
        };
        let event = match command {
            SessionCommand::Select { question, option } => {
                if self.session.select_answer(question, option) {
                    SessionEvent::AnswerRecorded {
                        question,
                        option,
                        answered: self.session.answers().len(),
                        total: self.session.questions().len(),
                    }
                } else {
                    ignored
                }
            }
            SessionCommand::Submit => match self.session.request_submit() {
                SubmitOutcome::Finished(result) => self.finished(result),
                SubmitOutcome::NeedsConfirmation { unanswered } => {
                    SessionEvent::ConfirmationRequired { unanswered }
                }
                SubmitOutcome::Ignored => ignored,
            },
            SessionCommand::Confirm => match self.session.confirm_submit() {
                Some(result) => self.finished(result),
                None => ignored,
            },
            SessionCommand::Cancel => {
                if self.session.cancel_submit() {
                    SessionEvent::ConfirmationDismissed {
                        seconds_remaining: self.session.seconds_remaining(),
                    }
                } else {
                    ignored
                }
            }
            SessionCommand::Retake => {
                if self.session.retake() {
                    self.start_timer();
                    SessionEvent::Restarted {
                        attempt: self.session.attempt(),
                        seconds_remaining: self.session.seconds_remaining(),
                    }
                } else {
                    ignored
                }
            }
            SessionCommand::Snapshot => SessionEvent::Snapshot(self.session.snapshot()),
            SessionCommand::Quit => return None,
        };
        Some(event)
    }

    fn finished(&mut self, result: ScoreResult) -> SessionEvent {
        self.stop_timer();
        let report = self.session.last_report().cloned();
        if matches!(report, Some(ReportOutcome::Reported)) {
            self.completion_reported = true;
        }
        SessionEvent::Finished {
            result,
            forced: self.session.was_forced(),
            report,
        }
    }
}

/// Resolves on the next tick; never resolves without a running timer.
async fn next_tick(timer: &mut Option<SessionTimer>) {
    match timer {
        Some(timer) => {
            if timer.next_tick().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        None => std::future::pending().await,
    }
}

async fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    tracing::debug!(?event, "session event");
    if events.send(event).await.is_err() {
        tracing::debug!("event receiver dropped");
    }
}
