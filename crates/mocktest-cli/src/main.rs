//! mocktest CLI: courses, topics, and timed mock tests in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use mocktest_core::model::Level;

mod commands;

#[derive(Parser)]
#[command(
    name = "mocktest",
    version,
    about = "Self-study courses with timed mock tests"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and a sample question set
    Init,

    /// Create and inspect courses
    Course {
        #[command(subcommand)]
        action: CourseCommand,
    },

    /// Take a timed mock test for one course topic
    Take {
        /// Course id, id prefix, or name
        #[arg(long)]
        course: String,

        /// Topic number as shown by `course show`
        #[arg(long)]
        topic: u32,

        /// Use questions from a JSON file instead of generating them
        #[arg(long)]
        questions: Option<PathBuf>,

        /// Provider used to generate questions
        #[arg(long)]
        provider: Option<String>,
    },

    /// Validate a question set JSON file
    Validate {
        /// Path to the question set
        #[arg(long)]
        questions: PathBuf,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,
    },
}

#[derive(Subcommand)]
enum CourseCommand {
    /// Add a course and generate its learning path
    New {
        /// Course subject, e.g. "Rust" or "Linear Algebra"
        #[arg(long)]
        name: String,

        /// beginner, intermediate, or advanced
        #[arg(long, default_value = "beginner")]
        level: Level,

        /// Topic titles to use instead of generating them (repeatable)
        #[arg(long = "topic")]
        topics: Vec<String>,

        /// Create the course without topics
        #[arg(long)]
        no_generate: bool,

        /// Provider used to generate topics
        #[arg(long)]
        provider: Option<String>,
    },

    /// Generate (or set) the topics of an existing course
    Topics {
        /// Course id, id prefix, or name
        course: String,

        /// Topic titles to use instead of generating them (repeatable)
        #[arg(long = "topic")]
        topics: Vec<String>,

        /// Discard the current topics and their progress
        #[arg(long)]
        replace: bool,

        /// Provider used to generate topics
        #[arg(long)]
        provider: Option<String>,
    },

    /// List courses and their progress
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one course's topics
    Show {
        /// Course id, id prefix, or name
        course: String,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "mocktest=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    // stdout belongs to the interactive test.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Course { action } => match action {
            CourseCommand::New {
                name,
                level,
                topics,
                no_generate,
                provider,
            } => {
                commands::course::new(name, level, topics, no_generate, provider, config).await
            }
            CourseCommand::Topics {
                course,
                topics,
                replace,
                provider,
            } => commands::course::topics(course, topics, replace, provider, config).await,
            CourseCommand::List { json } => commands::course::list(json, config),
            CourseCommand::Show { course } => commands::course::show(course, config),
        },
        Commands::Take {
            course,
            topic,
            questions,
            provider,
        } => commands::take::execute(course, topic, questions, provider, config).await,
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::ListModels { provider } => commands::list_models::execute(provider, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
