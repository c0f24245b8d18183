use std::sync::Arc;

use storage::{CourseRepository, StorageError};
use twin_core::Clock;
use twin_core::error::{CourseError, NotFoundError};
use twin_core::model::{AssessmentId, Course, CourseId, ItemCategory, ItemId};

use crate::error::CourseServiceError;

/// How many times a mutation re-reads and retries after a version conflict
/// before giving up.
const MAX_COMMIT_ATTEMPTS: u32 = 8;

/// Orchestrates the course store and applies all mutations.
///
/// Every mutation follows the same discipline: read the course, apply the
/// change through the domain aggregate (which recomputes progress and bumps
/// the version), then commit with compare-and-set. A conflicting commit means
/// someone else wrote in between; the mutation re-reads and re-derives its
/// change instead of re-applying a stale delta, so the returned course is
/// always internally consistent.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>) -> Self {
        Self { clock, courses }
    }

    /// Create a new course and persist it.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if title or code is empty and
    /// `CourseServiceError::Storage` if persistence fails.
    pub async fn create_course(
        &self,
        title: String,
        code: String,
        semester: Option<String>,
    ) -> Result<Course, CourseServiceError> {
        let now = self.clock.now();
        // Placeholder id; the repository assigns the real one.
        let course = Course::new(CourseId::new(0), title, code, semester, now)
            .map_err(CourseError::from)?;
        let id = self.courses.insert_course(course).await?;
        self.require_course(id).await
    }

    /// Fetch a course by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError::Course` (wrapped) for an unknown id.
    pub async fn get_course(&self, course_id: CourseId) -> Result<Course, CourseServiceError> {
        self.require_course(course_id).await
    }

    /// All courses, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list_courses(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_courses().await?)
    }

    /// Add an item to one of the course's toggleable categories.
    ///
    /// Returns the updated course; the new item's id is the highest in its
    /// category.
    ///
    /// # Errors
    ///
    /// Returns a validation failure for an empty title, a not-found failure
    /// for an unknown course, or a storage failure.
    pub async fn add_item(
        &self,
        course_id: CourseId,
        category: ItemCategory,
        title: String,
    ) -> Result<Course, CourseServiceError> {
        self.commit(course_id, |course| {
            course.add_item(category, title.clone())?;
            Ok(())
        })
        .await
    }

    /// Add an ungraded assessment.
    ///
    /// # Errors
    ///
    /// Same failure modes as `add_item`, plus an invalid max score.
    pub async fn add_assessment(
        &self,
        course_id: CourseId,
        title: String,
        max_score: f64,
    ) -> Result<Course, CourseServiceError> {
        self.commit(course_id, |course| {
            course.add_assessment(title.clone(), max_score)?;
            Ok(())
        })
        .await
    }

    /// Flip one item's completion flag and return the updated course.
    ///
    /// The flip is keyed on the completion state observed at entry, so a
    /// retried copy of the same request cannot apply twice (see
    /// `toggle_item_from`).
    ///
    /// # Errors
    ///
    /// Returns a not-found failure for an unknown course or item.
    pub async fn toggle_item(
        &self,
        course_id: CourseId,
        category: ItemCategory,
        item_id: ItemId,
    ) -> Result<Course, CourseServiceError> {
        let course = self.require_course(course_id).await?;
        let observed = course
            .item(category, item_id)
            .ok_or(NotFoundError::Item {
                category,
                id: item_id,
            })?
            .completed();
        self.toggle_item_from(course_id, category, item_id, observed)
            .await
    }

    /// Flip an item only if it is still in the state the caller observed.
    ///
    /// This is the retry-safe form: when a commit conflicts and the re-read
    /// shows the item already moved past `observed_completed`, the flip this
    /// request describes has landed (most likely via a concurrent retry of
    /// the same request) and the current course is returned without flipping
    /// again.
    ///
    /// # Errors
    ///
    /// Returns a not-found failure for an unknown course or item, or a
    /// storage failure if commits keep conflicting.
    pub async fn toggle_item_from(
        &self,
        course_id: CourseId,
        category: ItemCategory,
        item_id: ItemId,
        observed_completed: bool,
    ) -> Result<Course, CourseServiceError> {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let mut course = self.require_course(course_id).await?;
            let current = course
                .item(category, item_id)
                .ok_or(NotFoundError::Item {
                    category,
                    id: item_id,
                })?
                .completed();
            if current != observed_completed {
                // Already applied; flipping again would double-apply.
                return Ok(course);
            }

            let read_version = course.version();
            course
                .toggle_item(category, item_id)
                .map_err(CourseError::from)?;
            match self.courses.update_course(&course, read_version).await {
                Ok(()) => return Ok(course),
                Err(StorageError::Conflict) => {
                    tracing::debug!(
                        course = %course_id,
                        %category,
                        item = %item_id,
                        attempt,
                        "toggle commit conflicted, re-reading"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StorageError::Conflict.into())
    }

    /// Record a grade on an assessment, overwriting any prior one.
    ///
    /// # Errors
    ///
    /// Returns a validation failure for an out-of-range score (course left
    /// unchanged) or a not-found failure for an unknown course/assessment.
    pub async fn record_score(
        &self,
        course_id: CourseId,
        assessment_id: AssessmentId,
        score: f64,
    ) -> Result<Course, CourseServiceError> {
        self.commit(course_id, |course| course.record_score(assessment_id, score))
            .await
    }

    async fn require_course(&self, course_id: CourseId) -> Result<Course, CourseServiceError> {
        self.courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| NotFoundError::Course(course_id).into())
    }

    /// Read–apply–commit loop shared by mutations whose effect does not
    /// depend on previously observed state.
    async fn commit<F>(
        &self,
        course_id: CourseId,
        mut apply: F,
    ) -> Result<Course, CourseServiceError>
    where
        F: FnMut(&mut Course) -> Result<(), CourseError>,
    {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let mut course = self.require_course(course_id).await?;
            let read_version = course.version();
            apply(&mut course)?;
            match self.courses.update_course(&course, read_version).await {
                Ok(()) => return Ok(course),
                Err(StorageError::Conflict) => {
                    tracing::debug!(course = %course_id, attempt, "commit conflicted, re-reading");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StorageError::Conflict.into())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use storage::InMemoryRepository;
    use twin_core::error::ValidationError;
    use twin_core::time::fixed_now;

    fn service() -> CourseService {
        CourseService::new(Clock::fixed(fixed_now()), Arc::new(InMemoryRepository::new()))
    }

    /// Rejects the next `conflicts` commits before delegating to the inner
    /// store, without anyone actually having written in between.
    struct FlakyRepository {
        inner: InMemoryRepository,
        conflicts: AtomicU32,
    }

    impl FlakyRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryRepository::new(),
                conflicts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl CourseRepository for FlakyRepository {
        async fn insert_course(&self, course: Course) -> Result<CourseId, StorageError> {
            self.inner.insert_course(course).await
        }

        async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
            self.inner.get_course(id).await
        }

        async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
            self.inner.list_courses().await
        }

        async fn update_course(
            &self,
            course: &Course,
            expected_version: u64,
        ) -> Result<(), StorageError> {
            if self.conflicts.load(Ordering::SeqCst) > 0 {
                self.conflicts.fetch_sub(1, Ordering::SeqCst);
                return Err(StorageError::Conflict);
            }
            self.inner.update_course(course, expected_version).await
        }
    }

    /// Applies the same toggle to the inner store right before failing the
    /// first commit, the way a concurrent retry of the request would.
    struct RacingToggleRepository {
        inner: InMemoryRepository,
        category: ItemCategory,
        item: ItemId,
        raced: AtomicBool,
    }

    #[async_trait]
    impl CourseRepository for RacingToggleRepository {
        async fn insert_course(&self, course: Course) -> Result<CourseId, StorageError> {
            self.inner.insert_course(course).await
        }

        async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
            self.inner.get_course(id).await
        }

        async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
            self.inner.list_courses().await
        }

        async fn update_course(
            &self,
            course: &Course,
            expected_version: u64,
        ) -> Result<(), StorageError> {
            if !self.raced.swap(true, Ordering::SeqCst) {
                let mut current = self
                    .inner
                    .get_course(course.id())
                    .await?
                    .ok_or(StorageError::NotFound)?;
                let version = current.version();
                current
                    .toggle_item(self.category, self.item)
                    .map_err(|_| StorageError::NotFound)?;
                self.inner.update_course(&current, version).await?;
                return Err(StorageError::Conflict);
            }
            self.inner.update_course(course, expected_version).await
        }
    }

    #[tokio::test]
    async fn create_course_requires_title_and_code() {
        let service = service();
        let err = service
            .create_course("  ".into(), "CS301".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Course(CourseError::Validation(ValidationError::EmptyTitle))
        ));
    }

    #[tokio::test]
    async fn create_course_persists_and_assigns_id() {
        let service = service();
        let course = service
            .create_course("Algorithms".into(), "CS301".into(), Some("Fall".into()))
            .await
            .unwrap();
        assert_eq!(course.id(), CourseId::new(1));

        let fetched = service.get_course(course.id()).await.unwrap();
        assert_eq!(fetched.title(), "Algorithms");
        assert_eq!(fetched.progress_percent(), 0);
    }

    #[tokio::test]
    async fn add_item_to_unknown_course_fails() {
        let service = service();
        let err = service
            .add_item(CourseId::new(9), ItemCategory::Lesson, "Arrays".into())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Course(CourseError::NotFound(NotFoundError::Course(_)))
        ));
    }

    #[tokio::test]
    async fn toggle_recomputes_progress_before_returning() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        service
            .add_item(course.id(), ItemCategory::Lesson, "Arrays".into())
            .await
            .unwrap();
        let course = service
            .add_item(course.id(), ItemCategory::Lesson, "Lists".into())
            .await
            .unwrap();

        let toggled = service
            .toggle_item(course.id(), ItemCategory::Lesson, ItemId::new(1))
            .await
            .unwrap();
        assert_eq!(toggled.progress_percent(), 50);
        assert!(
            toggled
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );
    }

    #[tokio::test]
    async fn double_toggle_is_an_involution() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        service
            .add_item(course.id(), ItemCategory::Lab, "Lab 1".into())
            .await
            .unwrap();

        service
            .toggle_item(course.id(), ItemCategory::Lab, ItemId::new(1))
            .await
            .unwrap();
        let after = service
            .toggle_item(course.id(), ItemCategory::Lab, ItemId::new(1))
            .await
            .unwrap();
        assert!(
            !after
                .item(ItemCategory::Lab, ItemId::new(1))
                .unwrap()
                .completed()
        );
        assert_eq!(after.progress_percent(), 0);
    }

    #[tokio::test]
    async fn stale_retry_flips_exactly_once() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        service
            .add_item(course.id(), ItemCategory::Lesson, "Arrays".into())
            .await
            .unwrap();

        // Two copies of the same request, both formed against completed=false.
        let first = service
            .toggle_item_from(course.id(), ItemCategory::Lesson, ItemId::new(1), false)
            .await
            .unwrap();
        assert!(
            first
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );

        let second = service
            .toggle_item_from(course.id(), ItemCategory::Lesson, ItemId::new(1), false)
            .await
            .unwrap();
        // The retry observed the flip already applied and left it alone.
        assert!(
            second
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );
        assert_eq!(second.version(), first.version());
    }

    #[tokio::test]
    async fn toggle_unknown_item_fails() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        let err = service
            .toggle_item(course.id(), ItemCategory::Module, ItemId::new(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Course(CourseError::NotFound(NotFoundError::Item { .. }))
        ));
    }

    #[tokio::test]
    async fn record_score_rejects_out_of_range_and_keeps_state() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        let course = service
            .add_assessment(course.id(), "Quiz 1".into(), 10.0)
            .await
            .unwrap();
        let assessment_id = course.assessments()[0].id();

        let err = service
            .record_score(course.id(), assessment_id, 11.0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Course(CourseError::Validation(
                ValidationError::ScoreOutOfRange { .. }
            ))
        ));

        // Store is untouched and still usable.
        let stored = service.get_course(course.id()).await.unwrap();
        assert_eq!(stored.assessment(assessment_id).unwrap().score(), None);
        assert_eq!(stored.version(), course.version());
    }

    #[tokio::test]
    async fn record_score_is_idempotent_in_effect() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        let course = service
            .add_assessment(course.id(), "Quiz 1".into(), 10.0)
            .await
            .unwrap();
        let assessment_id = course.assessments()[0].id();

        let first = service
            .record_score(course.id(), assessment_id, 8.0)
            .await
            .unwrap();
        let second = service
            .record_score(course.id(), assessment_id, 8.0)
            .await
            .unwrap();
        assert_eq!(first.assessment(assessment_id).unwrap().score(), Some(8.0));
        assert_eq!(second.assessment(assessment_id).unwrap().score(), Some(8.0));
        assert_eq!(first.progress_percent(), second.progress_percent());
    }

    #[tokio::test]
    async fn worked_progress_example() {
        let service = service();
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        service
            .add_item(course.id(), ItemCategory::Lesson, "Arrays".into())
            .await
            .unwrap();
        service
            .add_item(course.id(), ItemCategory::Lesson, "Lists".into())
            .await
            .unwrap();
        let with_quiz = service
            .add_assessment(course.id(), "Quiz 1".into(), 10.0)
            .await
            .unwrap();
        let assessment_id = with_quiz.assessments()[0].id();

        service
            .toggle_item(course.id(), ItemCategory::Lesson, ItemId::new(1))
            .await
            .unwrap();
        let course = service
            .record_score(course.id(), assessment_id, 8.0)
            .await
            .unwrap();

        // Lessons 50%, assessments 80%: round((50 + 80) / 2) = 65.
        assert_eq!(course.progress_percent(), 65);
    }

    #[tokio::test]
    async fn conflicting_commit_is_retried_and_applies_once() {
        let repo = Arc::new(FlakyRepository::new());
        let service = CourseService::new(Clock::fixed(fixed_now()), repo.clone());
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        let course = service
            .add_item(course.id(), ItemCategory::Lesson, "Arrays".into())
            .await
            .unwrap();

        repo.conflicts.store(1, Ordering::SeqCst);
        let toggled = service
            .toggle_item(course.id(), ItemCategory::Lesson, ItemId::new(1))
            .await
            .unwrap();

        assert_eq!(repo.conflicts.load(Ordering::SeqCst), 0);
        assert!(
            toggled
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );
        // One retry, one committed write: the version moved exactly once.
        assert_eq!(toggled.version(), course.version() + 1);
    }

    #[tokio::test]
    async fn exhausted_commit_attempts_surface_the_conflict() {
        let repo = Arc::new(FlakyRepository::new());
        let service = CourseService::new(Clock::fixed(fixed_now()), repo.clone());
        let course = service
            .create_course("Algo".into(), "CS301".into(), None)
            .await
            .unwrap();
        let course = service
            .add_item(course.id(), ItemCategory::Lesson, "Arrays".into())
            .await
            .unwrap();

        repo.conflicts.store(u32::MAX, Ordering::SeqCst);
        let err = service
            .toggle_item(course.id(), ItemCategory::Lesson, ItemId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CourseServiceError::Storage(StorageError::Conflict)
        ));

        repo.conflicts.store(0, Ordering::SeqCst);
        let stored = service.get_course(course.id()).await.unwrap();
        assert!(
            !stored
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );
        assert_eq!(stored.version(), course.version());
    }

    #[tokio::test]
    async fn conflict_caused_by_the_same_toggle_is_not_reapplied() {
        let inner = InMemoryRepository::new();
        let mut course = Course::new(
            CourseId::new(0),
            "Algo",
            "CS301",
            None,
            fixed_now(),
        )
        .unwrap();
        course
            .add_item(ItemCategory::Lesson, "Arrays".to_owned())
            .unwrap();
        let course_id = inner.insert_course(course).await.unwrap();

        let repo = Arc::new(RacingToggleRepository {
            inner,
            category: ItemCategory::Lesson,
            item: ItemId::new(1),
            raced: AtomicBool::new(false),
        });
        let service = CourseService::new(Clock::fixed(fixed_now()), repo.clone());

        let result = service
            .toggle_item_from(course_id, ItemCategory::Lesson, ItemId::new(1), false)
            .await
            .unwrap();

        // The racing write already flipped the item; the retry must not
        // flip it back.
        assert!(
            result
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );
        let stored = repo.inner.get_course(course_id).await.unwrap().unwrap();
        assert_eq!(stored.version(), result.version());
        assert!(
            stored
                .item(ItemCategory::Lesson, ItemId::new(1))
                .unwrap()
                .completed()
        );
    }
}
