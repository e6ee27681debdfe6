//! Course catalog and its JSON-file progress store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Course, Level, Topic, TopicDraft};
use crate::traits::ProgressStore;

/// All courses a learner has created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseCatalog {
    #[serde(default)]
    pub courses: Vec<Course>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty course and return it.
    pub fn add_course(&mut self, name: &str, level: Level) -> &Course {
        let course = Course::new(name, level);
        tracing::debug!(id = %course.id, name = %course.name, "course added");
        self.courses.push(course);
        &self.courses[self.courses.len() - 1]
    }

    pub fn get(&self, id: Uuid) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Course, StoreError> {
        self.courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::CourseNotFound(id.to_string()))
    }

    /// Look a course up by full id, id prefix, or case-insensitive name.
    pub fn find(&self, key: &str) -> Option<&Course> {
        let key = key.trim();
        if let Ok(id) = Uuid::parse_str(key) {
            return self.get(id);
        }
        let lowered = key.to_lowercase();
        self.courses
            .iter()
            .find(|c| c.name.to_lowercase() == lowered)
            .or_else(|| {
                let mut matches = self
                    .courses
                    .iter()
                    .filter(|c| key.len() >= 4 && c.id.to_string().starts_with(&lowered));
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
    }

    /// Replace a course's topics; ids follow list position.
    pub fn set_topics(&mut self, course_id: Uuid, drafts: Vec<TopicDraft>) -> Result<(), StoreError> {
        let course = self.get_mut(course_id)?;
        course.topics = drafts
            .into_iter()
            .enumerate()
            .map(|(i, d)| Topic {
                id: i as u32,
                title: d.title,
                description: d.description,
                completed: false,
                score: None,
                completed_at: None,
            })
            .collect();
        Ok(())
    }

    /// Mark a topic completed with the given score.
    pub fn record_completion(
        &mut self,
        course_id: Uuid,
        topic_id: u32,
        percentage: f64,
    ) -> Result<(), StoreError> {
        let course = self.get_mut(course_id)?;
        let topic = course
            .topic_mut(topic_id)
            .ok_or_else(|| StoreError::TopicNotFound {
                course_id: course_id.to_string(),
                topic_id,
            })?;
        topic.completed = true;
        topic.score = Some(percentage);
        topic.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Save the catalog as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a catalog from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a catalog, treating a missing file as an empty catalog.
    pub fn load_or_default(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            Self::load_json(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// A [`CourseCatalog`] persisted to one JSON file after every change.
#[derive(Debug)]
pub struct JsonCourseStore {
    path: PathBuf,
    catalog: Mutex<CourseCatalog>,
}

impl JsonCourseStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let catalog = CourseCatalog::load_or_default(&path)?;
        Ok(Self {
            path,
            catalog: Mutex::new(catalog),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, CourseCatalog> {
        self.catalog.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A copy of the current catalog.
    pub fn catalog(&self) -> CourseCatalog {
        self.lock().clone()
    }

    /// Apply `change` and persist the result.
    pub fn update<R>(
        &self,
        change: impl FnOnce(&mut CourseCatalog) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut catalog = self.lock();
        let value = change(&mut catalog)?;
        catalog.save_json(&self.path)?;
        Ok(value)
    }
}

impl ProgressStore for JsonCourseStore {
    fn record_completion(
        &self,
        course_id: Uuid,
        topic_id: u32,
        percentage: f64,
    ) -> Result<(), StoreError> {
        self.update(|catalog| catalog.record_completion(course_id, topic_id, percentage))?;
        tracing::info!(%course_id, topic_id, percentage, "topic completed");
        Ok(())
    }
}
