//! End-to-end tests of the session host on a paused clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mocktest_core::engine::{Phase, SessionConfig, TestSession};
use mocktest_core::model::Question;
use mocktest_core::reporter::ReportOutcome;
use mocktest_runner::{HostSummary, SessionCommand, SessionEvent, SessionHost};

fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| Question::new(&format!("Question {i}?"), ["right", "wrong", "nope", "no"], 0))
        .collect()
}

struct Harness {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::Receiver<SessionEvent>,
    host: JoinHandle<HostSummary>,
}

impl Harness {
    fn spawn(session: TestSession) -> Self {
        let (commands, command_rx) = mpsc::channel(16);
        let (event_tx, events) = mpsc::channel(64);
        let host = tokio::spawn(SessionHost::new(session).run(command_rx, event_tx));
        Self {
            commands,
            events,
            host,
        }
    }

    async fn send(&self, command: SessionCommand) {
        self.commands.send(command).await.unwrap();
    }

    /// Next event that is not a plain clock tick.
    async fn next_event(&mut self) -> SessionEvent {
        loop {
            match self.events.recv().await.expect("host stopped") {
                SessionEvent::Tick { .. } => continue,
                other => return other,
            }
        }
    }

    async fn request(&mut self, command: SessionCommand) -> SessionEvent {
        self.send(command).await;
        self.next_event().await
    }

    async fn finish(self) -> HostSummary {
        drop(self.commands);
        self.host.await.unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_forces_submission_and_stops_the_clock() {
    let mut harness = Harness::spawn(TestSession::start(questions(2)).unwrap());

    let mut last_seen = 300;
    let mut ticks = 0;
    let (result, forced, report) = loop {
        match harness.events.recv().await.unwrap() {
            SessionEvent::Tick {
                seconds_remaining, ..
            } => {
                assert_eq!(seconds_remaining, last_seen - 1);
                last_seen = seconds_remaining;
                ticks += 1;
            }
            SessionEvent::Finished {
                result,
                forced,
                report,
            } => break (result, forced, report),
            other => panic!("unexpected event: {other:?}"),
        }
    };

    assert_eq!(ticks, 299);
    assert!(forced);
    assert_eq!(result.percentage, 0.0);
    assert!(!result.passed);
    assert_eq!(report, Some(ReportOutcome::NotPassed));

    // Nothing ticks once the session is over.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(harness.events.try_recv().is_err());

    match harness.request(SessionCommand::Snapshot).await {
        SessionEvent::Snapshot(snapshot) => {
            assert_eq!(snapshot.phase, Phase::Finished);
            assert_eq!(snapshot.seconds_remaining, 0);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let summary = harness.finish().await;
    assert_eq!(summary.attempts, 1);
    assert!(!summary.completion_reported);
    assert_eq!(summary.last_result, Some(result));
}

#[tokio::test(start_paused = true)]
async fn pass_is_reported_once_per_attempt() {
    let reports = Arc::new(AtomicUsize::new(0));
    let counter = reports.clone();
    let session = TestSession::start(questions(3))
        .unwrap()
        .with_completion_sink(move |_: f64| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let mut harness = Harness::spawn(session);

    for attempt in 1..=2u32 {
        for q in 0..3 {
            let event = harness
                .request(SessionCommand::Select {
                    question: q,
                    option: 0,
                })
                .await;
            assert_eq!(
                event,
                SessionEvent::AnswerRecorded {
                    question: q,
                    option: 0,
                    answered: q + 1,
                    total: 3,
                }
            );
        }

        match harness.request(SessionCommand::Submit).await {
            SessionEvent::Finished {
                result,
                forced,
                report,
            } => {
                assert_eq!(result.percentage, 100.0);
                assert!(!forced);
                assert_eq!(report, Some(ReportOutcome::Reported));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(reports.load(Ordering::SeqCst), attempt as usize);

        assert_eq!(
            harness.request(SessionCommand::Submit).await,
            SessionEvent::Ignored {
                command: "submit",
                phase: Phase::Finished,
            }
        );

        if attempt == 1 {
            assert_eq!(
                harness.request(SessionCommand::Retake).await,
                SessionEvent::Restarted {
                    attempt: 2,
                    seconds_remaining: 300,
                }
            );
        }
    }

    harness.send(SessionCommand::Quit).await;
    let summary = harness.host.await.unwrap();
    assert_eq!(summary.attempts, 2);
    assert!(summary.completion_reported);
    assert_eq!(reports.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn clock_keeps_running_while_confirming() {
    let mut harness = Harness::spawn(TestSession::start(questions(3)).unwrap());

    harness
        .request(SessionCommand::Select {
            question: 0,
            option: 0,
        })
        .await;
    assert_eq!(
        harness.request(SessionCommand::Submit).await,
        SessionEvent::ConfirmationRequired { unanswered: 2 }
    );

    let mut last_seen = u32::MAX;
    for _ in 0..5 {
        match harness.events.recv().await.unwrap() {
            SessionEvent::Tick {
                seconds_remaining, ..
            } => {
                assert!(seconds_remaining < last_seen);
                last_seen = seconds_remaining;
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
    assert!(last_seen <= 295);

    match harness.request(SessionCommand::Cancel).await {
        SessionEvent::ConfirmationDismissed { seconds_remaining } => {
            assert!(seconds_remaining <= last_seen);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    match harness.request(SessionCommand::Snapshot).await {
        SessionEvent::Snapshot(snapshot) => {
            assert_eq!(snapshot.phase, Phase::InProgress);
            assert_eq!(snapshot.answered, 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    assert_eq!(
        harness.request(SessionCommand::Confirm).await,
        SessionEvent::Ignored {
            command: "confirm",
            phase: Phase::InProgress,
        }
    );

    let summary = harness.finish().await;
    assert_eq!(summary.last_result, None);
}

#[tokio::test(start_paused = true)]
async fn confirmation_window_dismisses_prompt() {
    let config = SessionConfig {
        confirmation_window_secs: Some(3),
        ..SessionConfig::default()
    };
    let mut harness = Harness::spawn(TestSession::with_config(questions(2), config).unwrap());

    assert_eq!(
        harness.request(SessionCommand::Submit).await,
        SessionEvent::ConfirmationRequired { unanswered: 2 }
    );

    match harness.next_event().await {
        SessionEvent::ConfirmationDismissed { seconds_remaining } => {
            assert!(seconds_remaining < 300);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Back in progress, so submitting asks again.
    assert_eq!(
        harness.request(SessionCommand::Submit).await,
        SessionEvent::ConfirmationRequired { unanswered: 2 }
    );
    assert_eq!(
        harness.request(SessionCommand::Confirm).await,
        SessionEvent::Finished {
            result: mocktest_core::evaluator::ScoreResult {
                percentage: 0.0,
                passed: false,
                correct: 0,
                total: 2,
            },
            forced: false,
            report: Some(ReportOutcome::NotPassed),
        }
    );
    harness.finish().await;
}

#[tokio::test(start_paused = true)]
async fn retake_restarts_the_countdown() {
    let config = SessionConfig {
        duration_secs: 5,
        ..SessionConfig::default()
    };
    let mut harness = Harness::spawn(TestSession::with_config(questions(1), config).unwrap());

    assert!(matches!(
        harness.next_event().await,
        SessionEvent::Finished { forced: true, .. }
    ));
    assert_eq!(
        harness.request(SessionCommand::Retake).await,
        SessionEvent::Restarted {
            attempt: 2,
            seconds_remaining: 5,
        }
    );

    match harness.events.recv().await.unwrap() {
        SessionEvent::Tick {
            seconds_remaining,
            time_low,
        } => {
            assert_eq!(seconds_remaining, 4);
            assert!(time_low);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    assert!(matches!(
        harness.next_event().await,
        SessionEvent::Finished { forced: true, .. }
    ));
    let summary = harness.finish().await;
    assert_eq!(summary.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn quit_stops_the_host_mid_attempt() {
    let mut harness = Harness::spawn(TestSession::start(questions(2)).unwrap());
    harness
        .request(SessionCommand::Select {
            question: 1,
            option: 0,
        })
        .await;

    harness.send(SessionCommand::Quit).await;
    let summary = harness.host.await.unwrap();
    assert_eq!(summary.attempts, 1);
    assert!(summary.last_result.is_none());
    assert!(!summary.completion_reported);

    // Nothing is emitted for the quit itself.
    while let Some(event) = harness.events.recv().await {
        assert!(matches!(event, SessionEvent::Tick { .. }), "unexpected {event:?}");
    }
}
