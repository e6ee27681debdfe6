//! The `mocktest course` commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use mocktest_core::model::{Course, Level, TopicDraft};
use mocktest_core::store::{CourseCatalog, JsonCourseStore};
use mocktest_core::traits::TopicPlanner;
use mocktest_providers::config::load_config_from;

use super::planner_from_config;

pub async fn new(
    name: String,
    level: Level,
    topics: Vec<String>,
    no_generate: bool,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!name.trim().is_empty(), "course name must not be empty");
    let config = load_config_from(config_path.as_deref())?;

    let drafts: Vec<TopicDraft> = if !topics.is_empty() {
        topics
            .into_iter()
            .map(|title| TopicDraft {
                title,
                description: String::new(),
            })
            .collect()
    } else if no_generate {
        Vec::new()
    } else {
        eprintln!("Generating a {level} learning path for {}...", name.trim());
        planner_from_config(&config, provider.as_deref())?
            .generate_topics(&name, level)
            .await?
    };

    let store = JsonCourseStore::open(&config.store_path)?;
    let course = store.update(|catalog| {
        let id = catalog.add_course(&name, level).id;
        catalog.set_topics(id, drafts)?;
        Ok(catalog.get(id).cloned())
    })?;
    let course = course.context("course vanished after creation")?;

    println!("Created course {} ({})", course.name, course.id);
    print_topics(&course);
    Ok(())
}

/// Fill in the learning path of an existing course.
///
/// Courses created with `--no-generate`, or whose generation failed, start
/// empty; running this again is the retry. `--replace` discards existing
/// topics and their progress.
pub async fn topics(
    key: String,
    topics: Vec<String>,
    replace: bool,
    provider: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = JsonCourseStore::open(&config.store_path)?;
    let catalog = store.catalog();
    let course = catalog
        .find(&key)
        .with_context(|| format!("course not found: {key}"))?;
    if !course.topics.is_empty() && !replace {
        anyhow::bail!(
            "course {} already has {} topics; pass --replace to regenerate them",
            course.name,
            course.topics.len()
        );
    }
    let (id, name, level) = (course.id, course.name.clone(), course.level);

    let drafts: Vec<TopicDraft> = if !topics.is_empty() {
        topics
            .into_iter()
            .map(|title| TopicDraft {
                title,
                description: String::new(),
            })
            .collect()
    } else {
        eprintln!("Generating a {level} learning path for {name}...");
        planner_from_config(&config, provider.as_deref())?
            .generate_topics(&name, level)
            .await
            .with_context(|| format!("run `mocktest course topics {key}` to try again"))?
    };
    tracing::info!(course = %id, topics = drafts.len(), "learning path updated");

    let course = store.update(|catalog| {
        catalog.set_topics(id, drafts)?;
        Ok(catalog.get(id).cloned())
    })?;
    let course = course.context("course vanished while updating topics")?;

    println!("Updated course {} ({})", course.name, course.id);
    print_topics(&course);
    Ok(())
}

pub fn list(json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = CourseCatalog::load_or_default(&config.store_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    if catalog.courses.is_empty() {
        println!("No courses yet. Create one with `mocktest course new --name <subject>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Course", "Level", "Topics", "Progress"]);
    for course in &catalog.courses {
        table.add_row(vec![
            Cell::new(short_id(course)),
            Cell::new(&course.name),
            Cell::new(course.level),
            Cell::new(course.topics.len()),
            Cell::new(format!("{:.0}%", course.progress())),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn show(key: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog = CourseCatalog::load_or_default(&config.store_path)?;
    let course = catalog
        .find(&key)
        .with_context(|| format!("course not found: {key}"))?;

    println!(
        "{} ({}, {}) {:.0}% complete",
        course.name,
        course.level,
        short_id(course),
        course.progress()
    );
    print_topics(course);
    Ok(())
}

fn short_id(course: &Course) -> String {
    course.id.to_string()[..8].to_string()
}

fn print_topics(course: &Course) {
    if course.topics.is_empty() {
        println!(
            "No topics. Add them with `mocktest course topics {}`.",
            short_id(course)
        );
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Topic", "Status", "Score", "Completed"]);
    for topic in &course.topics {
        table.add_row(vec![
            Cell::new(topic.id),
            Cell::new(&topic.title),
            Cell::new(if topic.completed { "done" } else { "open" }),
            Cell::new(
                topic
                    .score
                    .map(|s| format!("{s:.0}%"))
                    .unwrap_or_default(),
            ),
            Cell::new(
                topic
                    .completed_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    println!("{table}");
}
