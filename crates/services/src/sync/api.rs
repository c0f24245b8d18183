use std::fmt;

use async_trait::async_trait;
use twin_core::model::{AssessmentId, CourseId, ItemCategory, ItemId};

use crate::error::ApiError;
use crate::sync::wire::CourseWire;

/// Bearer token handed to every remote call.
///
/// Carried per call rather than stored in the client, so a token refresh
/// never races an in-flight mutation. The Debug impl masks the token.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"***").finish()
    }
}

/// The remote course endpoints the sync client drives.
///
/// Every mutation returns the server's updated course document, which the
/// caller adopts wholesale.
#[async_trait]
pub trait CourseApi: Send + Sync {
    async fn create_course(
        &self,
        credential: &Credential,
        title: &str,
        code: &str,
        semester: Option<&str>,
    ) -> Result<CourseWire, ApiError>;

    async fn fetch_course(
        &self,
        credential: &Credential,
        course: CourseId,
    ) -> Result<CourseWire, ApiError>;

    async fn list_courses(&self, credential: &Credential) -> Result<Vec<CourseWire>, ApiError>;

    async fn add_item(
        &self,
        credential: &Credential,
        course: CourseId,
        category: ItemCategory,
        title: &str,
    ) -> Result<CourseWire, ApiError>;

    async fn add_assessment(
        &self,
        credential: &Credential,
        course: CourseId,
        title: &str,
        max_score: f64,
    ) -> Result<CourseWire, ApiError>;

    async fn toggle_item(
        &self,
        credential: &Credential,
        course: CourseId,
        category: ItemCategory,
        item: ItemId,
    ) -> Result<CourseWire, ApiError>;

    async fn record_score(
        &self,
        credential: &Credential,
        course: CourseId,
        assessment: AssessmentId,
        score: f64,
    ) -> Result<CourseWire, ApiError>;
}
