use std::sync::Arc;

use twin_core::Clock;
use twin_core::error::CourseError;
use twin_core::model::{AssessmentId, Course, CourseId, ItemCategory, ItemId};

use crate::error::{SyncClientError, SyncError};
use crate::sync::api::{CourseApi, Credential};
use crate::sync::retry::{RetryPolicy, run_with_retry};

/// The locally held copy of one course.
///
/// Mutations land here first so the caller sees the effect immediately; the
/// sync client later replaces the whole course with the server's document or
/// rolls back to the pre-mutation snapshot.
#[derive(Debug, Clone)]
pub struct LocalCourseView {
    course: Course,
}

impl LocalCourseView {
    #[must_use]
    pub fn new(course: Course) -> Self {
        Self { course }
    }

    #[must_use]
    pub fn course(&self) -> &Course {
        &self.course
    }

    fn replace(&mut self, course: Course) {
        self.course = course;
    }
}

/// One course mutation as the caller expresses it.
#[derive(Debug, Clone)]
pub enum CourseMutation {
    ToggleItem {
        category: ItemCategory,
        item: ItemId,
    },
    RecordScore {
        assessment: AssessmentId,
        score: f64,
    },
    AddItem {
        category: ItemCategory,
        title: String,
    },
    AddAssessment {
        title: String,
        max_score: f64,
    },
}

/// Optimistic sync against the remote course backend.
///
/// `apply` runs a mutation locally first, then pushes it to the server with
/// bounded retry. The server's reply is authoritative: its course document
/// replaces the local one wholesale, including the server-computed progress,
/// version and insight indicators. If the remote call fails for good, the
/// local view reverts to its pre-mutation snapshot and the error surfaces.
pub struct SyncClient {
    api: Arc<dyn CourseApi>,
    retry: RetryPolicy,
    clock: Clock,
}

impl SyncClient {
    #[must_use]
    pub fn new(api: Arc<dyn CourseApi>, retry: RetryPolicy, clock: Clock) -> Self {
        Self { api, retry, clock }
    }

    /// Create a course remotely and return a view over the server's document.
    ///
    /// Title and code are validated locally first, so an obviously bad
    /// request never reaches the network.
    ///
    /// # Errors
    ///
    /// Returns the local validation failure, or `SyncError` if the remote
    /// call fails or replies with an undecodable course.
    pub async fn create_course(
        &self,
        credential: &Credential,
        title: &str,
        code: &str,
        semester: Option<&str>,
    ) -> Result<LocalCourseView, SyncClientError> {
        Course::new(
            CourseId::new(0),
            title,
            code,
            semester.map(str::to_owned),
            self.clock.now(),
        )
        .map_err(CourseError::from)?;

        let wire = run_with_retry(&self.retry, || {
            self.api.create_course(credential, title, code, semester)
        })
        .await?;
        let course = wire
            .into_course(self.clock.now())
            .map_err(SyncError::InvalidResponse)?;
        Ok(LocalCourseView::new(course))
    }

    /// Fetch the server's current document for one course.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the remote call fails or the reply does not
    /// decode into a valid course.
    pub async fn fetch_course(
        &self,
        credential: &Credential,
        course: CourseId,
    ) -> Result<LocalCourseView, SyncClientError> {
        let wire = run_with_retry(&self.retry, || self.api.fetch_course(credential, course)).await?;
        let course = wire
            .into_course(self.clock.now())
            .map_err(SyncError::InvalidResponse)?;
        Ok(LocalCourseView::new(course))
    }

    /// All of the caller's courses as the server sees them.
    ///
    /// # Errors
    ///
    /// Same failure modes as `fetch_course`.
    pub async fn list_courses(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Course>, SyncClientError> {
        let wires = run_with_retry(&self.retry, || self.api.list_courses(credential)).await?;
        let received_at = self.clock.now();
        wires
            .into_iter()
            .map(|wire| {
                wire.into_course(received_at)
                    .map_err(|err| SyncError::InvalidResponse(err).into())
            })
            .collect()
    }

    /// Apply one mutation optimistically and reconcile with the server.
    ///
    /// The local view is updated before the network round-trip. A mutation
    /// the domain itself rejects (unknown item, out-of-range score) fails
    /// immediately and never reaches the server. Once the server replies,
    /// its document replaces the local course; if the remote call fails
    /// after all retries, the view reverts to its pre-mutation state.
    ///
    /// # Errors
    ///
    /// Returns the domain failure for a locally invalid mutation, or
    /// `SyncError` if the remote side fails.
    pub async fn apply(
        &self,
        view: &mut LocalCourseView,
        credential: &Credential,
        mutation: CourseMutation,
    ) -> Result<(), SyncClientError> {
        let snapshot = view.course.clone();
        if let Err(err) = apply_locally(&mut view.course, &mutation) {
            return Err(err.into());
        }

        let course_id = snapshot.id();
        let remote = run_with_retry(&self.retry, || match &mutation {
            CourseMutation::ToggleItem { category, item } => {
                self.api.toggle_item(credential, course_id, *category, *item)
            }
            CourseMutation::RecordScore { assessment, score } => {
                self.api
                    .record_score(credential, course_id, *assessment, *score)
            }
            CourseMutation::AddItem { category, title } => {
                self.api.add_item(credential, course_id, *category, title)
            }
            CourseMutation::AddAssessment { title, max_score } => {
                self.api
                    .add_assessment(credential, course_id, title, *max_score)
            }
        })
        .await;

        match remote {
            Ok(wire) => match wire.into_course(self.clock.now()) {
                Ok(course) => {
                    view.replace(course);
                    Ok(())
                }
                Err(err) => {
                    view.replace(snapshot);
                    Err(SyncError::InvalidResponse(err).into())
                }
            },
            Err(err) => {
                tracing::debug!(course = %course_id, error = %err, "sync failed, reverting local view");
                view.replace(snapshot);
                Err(err.into())
            }
        }
    }
}

fn apply_locally(course: &mut Course, mutation: &CourseMutation) -> Result<(), CourseError> {
    match mutation {
        CourseMutation::ToggleItem { category, item } => {
            course.toggle_item(*category, *item)?;
        }
        CourseMutation::RecordScore { assessment, score } => {
            course.record_score(*assessment, *score)?;
        }
        CourseMutation::AddItem { category, title } => {
            course.add_item(*category, title.clone())?;
        }
        CourseMutation::AddAssessment { title, max_score } => {
            course.add_assessment(title.clone(), *max_score)?;
        }
    }
    Ok(())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
