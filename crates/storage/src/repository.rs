use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use twin_core::model::{Course, CourseId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// The course changed since the caller read it; re-read and retry.
    #[error("version conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),
}

/// Repository contract for the course store.
///
/// `update_course` is the single commit point for mutations and carries the
/// version the caller read. The adapter must reject the write with
/// `Conflict` when the stored version differs, which is what keeps each
/// item's completion flag under single-writer discipline: writers re-read
/// and re-derive instead of overwriting blind.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist a brand-new course and return the id the store assigned.
    ///
    /// The id carried by `course` is a placeholder; adapters replace it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn insert_course(&self, course: Course) -> Result<CourseId, StorageError>;

    /// Fetch a course by id.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failure.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// All courses, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failure.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Commit a mutated course if nobody else committed since the read.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course is unknown and
    /// `StorageError::Conflict` if the stored version is no longer
    /// `expected_version`.
    async fn update_course(
        &self,
        course: &Course,
        expected_version: u64,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for sessions and tests.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            courses: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_course(&self, course: Course) -> Result<CourseId, StorageError> {
        let id = CourseId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, course.with_id(id));
        Ok(id)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by_key(Course::id);
        Ok(courses)
    }

    async fn update_course(
        &self,
        course: &Course,
        expected_version: u64,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let stored = guard.get_mut(&course.id()).ok_or(StorageError::NotFound)?;
        if stored.version() != expected_version {
            return Err(StorageError::Conflict);
        }
        *stored = course.clone();
        Ok(())
    }
}
