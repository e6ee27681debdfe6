//! The `mocktest take` command: an interactive timed test on stdin/stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use mocktest_core::engine::{format_clock, TestSession};
use mocktest_core::model::{Question, OPTIONS_PER_QUESTION};
use mocktest_core::parser::load_question_file;
use mocktest_core::reporter::{ProgressSink, ReportOutcome};
use mocktest_core::store::JsonCourseStore;
use mocktest_core::traits::QuestionSource;
use mocktest_providers::config::load_config_from;
use mocktest_runner::{SessionCommand, SessionEvent, SessionHost};

use super::planner_from_config;

const OPTION_LABELS: [char; OPTIONS_PER_QUESTION] = ['a', 'b', 'c', 'd'];

const HELP: &str = "Commands: <question> <option> (e.g. `3 b`), submit, yes, no, retake, show, quit";

pub async fn execute(
    course_key: String,
    topic_id: u32,
    questions_path: Option<PathBuf>,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = Arc::new(JsonCourseStore::open(&config.store_path)?);

    let catalog = store.catalog();
    let course = catalog
        .find(&course_key)
        .with_context(|| format!("course not found: {course_key}"))?;
    let topic = course
        .topic(topic_id)
        .with_context(|| format!("topic {topic_id} not found in course {}", course.name))?;

    let questions = match &questions_path {
        Some(path) => load_question_file(path)?,
        None => {
            eprintln!("Generating questions for \"{}\"...", topic.title);
            planner_from_config(&config, provider.as_deref())?
                .fetch_questions(&topic.title)
                .await?
        }
    };

    let session = TestSession::with_config(questions, config.session)
        .context("cannot start the test")?
        .with_completion_sink(ProgressSink::new(store.clone(), course.id, topic.id));

    println!("{}: {}", course.name, topic.title);
    println!(
        "{} questions, {} on the clock, {:.0}% to pass.",
        session.questions().len(),
        format_clock(session.seconds_remaining()),
        session.config().pass_threshold
    );
    print_questions(session.questions());
    println!("{HELP}");

    let questions = session.questions().to_vec();
    let low_time = session.config().low_time_warning_secs;

    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let host = tokio::spawn(SessionHost::new(session).run(command_rx, event_tx));
    let input = tokio::spawn(read_commands(command_tx));

    let mut warned = false;
    while let Some(event) = event_rx.recv().await {
        if let SessionEvent::Tick { time_low: true, .. } = event {
            if !warned {
                warned = true;
                println!("Less than {} left!", format_clock(low_time));
            }
        }
        if let SessionEvent::Restarted { .. } = event {
            warned = false;
        }
        render(&event, &questions);
    }

    input.abort();
    let summary = host.await.context("session host failed")?;

    if let Some(result) = summary.last_result {
        println!(
            "Final: {:.1}% after {} attempt(s).",
            result.percentage, summary.attempts
        );
    }
    if summary.completion_reported {
        let progress = store
            .catalog()
            .get(course.id)
            .map(|c| c.progress())
            .unwrap_or_default();
        println!("Topic completed. Course progress: {progress:.0}%");
    }
    Ok(())
}

/// Forward stdin lines as session commands until EOF or `quit`.
async fn read_commands(commands: mpsc::Sender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("failed to read input: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                let quit = command == SessionCommand::Quit;
                if commands.send(command).await.is_err() || quit {
                    break;
                }
            }
            Err(message) => println!("{message}. {HELP}"),
        }
    }
}

/// Parse one line of learner input.
///
/// Questions are numbered from 1; options are `a`-`d` or `1`-`4`.
pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let line = line.trim().to_lowercase();
    let command = match line.as_str() {
        "submit" | "s" => SessionCommand::Submit,
        "yes" | "y" | "confirm" => SessionCommand::Confirm,
        "no" | "n" | "cancel" => SessionCommand::Cancel,
        "retake" | "r" => SessionCommand::Retake,
        "show" | "status" => SessionCommand::Snapshot,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        other => return parse_selection(other),
    };
    Ok(command)
}

fn parse_selection(input: &str) -> Result<SessionCommand, String> {
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("missing option in `{input}`"))?;
    let (number, option) = input.split_at(split);
    let number: usize = number
        .parse()
        .map_err(|_| format!("unrecognized input `{input}`"))?;
    if number == 0 {
        return Err("questions are numbered from 1".into());
    }

    let option = option.trim();
    let option = match option.chars().collect::<Vec<_>>().as_slice() {
        [c] if OPTION_LABELS.contains(c) => (*c as u8 - b'a') as usize,
        [c @ '1'..='4'] => (*c as u8 - b'1') as usize,
        _ => return Err(format!("unknown option `{option}`")),
    };

    Ok(SessionCommand::Select {
        question: number - 1,
        option,
    })
}

fn print_questions(questions: &[Question]) {
    for (i, q) in questions.iter().enumerate() {
        println!("\n{}. {}", i + 1, q.text);
        for (label, option) in OPTION_LABELS.iter().zip(&q.options) {
            println!("   {label}) {option}");
        }
    }
    println!();
}

fn render(event: &SessionEvent, questions: &[Question]) {
    match event {
        SessionEvent::Tick {
            seconds_remaining, ..
        } => {
            if seconds_remaining % 60 == 0 || *seconds_remaining <= 10 {
                println!("[{} left]", format_clock(*seconds_remaining));
            }
        }
        SessionEvent::AnswerRecorded {
            question,
            option,
            answered,
            total,
        } => println!(
            "Question {}: {} ({answered}/{total} answered)",
            question + 1,
            OPTION_LABELS[*option]
        ),
        SessionEvent::ConfirmationRequired { unanswered } => {
            println!("{unanswered} question(s) unanswered. Submit anyway? [yes/no]")
        }
        SessionEvent::ConfirmationDismissed { seconds_remaining } => {
            println!("Back to the test, {} left.", format_clock(*seconds_remaining))
        }
        SessionEvent::Finished {
            result,
            forced,
            report,
        } => {
            if *forced {
                println!("Time's up! Your answers were submitted.");
            }
            println!(
                "Score: {:.1}% ({}/{} correct), {}",
                result.percentage,
                result.correct,
                result.total,
                if result.passed { "passed" } else { "not passed" }
            );
            if let Some(ReportOutcome::Failed(reason)) = report {
                eprintln!("Warning: could not save progress: {reason}");
            }
            println!("Type `retake` to try again or `quit` to leave.");
        }
        SessionEvent::Restarted {
            attempt,
            seconds_remaining,
        } => {
            println!(
                "Attempt {attempt}: {} on the clock.",
                format_clock(*seconds_remaining)
            );
            print_questions(questions);
        }
        SessionEvent::Snapshot(snapshot) => println!(
            "{}: {}/{} answered, {} left, attempt {}",
            snapshot.phase,
            snapshot.answered,
            snapshot.total,
            format_clock(snapshot.seconds_remaining),
            snapshot.attempt
        ),
        SessionEvent::Ignored { command, phase } => {
            println!("Cannot {command} while the test is {phase}.")
        }
    }
}
