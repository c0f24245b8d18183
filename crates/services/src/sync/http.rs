use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use twin_core::model::{AssessmentId, CourseId, ItemCategory, ItemId};

use crate::error::ApiError;
use crate::sync::api::{CourseApi, Credential};
use crate::sync::wire::CourseWire;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the remote course backend lives.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads `TWIN_API_BASE_URL` and `TWIN_API_TIMEOUT_SECS`, falling back to
    /// the defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("TWIN_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let timeout = std::env::var("TWIN_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        Self { base_url, timeout }
    }
}

/// `CourseApi` over HTTP, speaking the backend's JSON dialect.
///
/// Paths follow the backend's routing: item categories appear singular in
/// the path (`lesson`, `module`, `lab`) and every request carries the bearer
/// credential.
#[derive(Debug, Clone)]
pub struct HttpCourseApi {
    client: reqwest::Client,
    config: HttpApiConfig,
}

#[derive(Serialize)]
struct CreateCourseBody<'a> {
    title: &'a str,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    semester: Option<&'a str>,
}

#[derive(Serialize)]
struct AddItemBody<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct AddAssessmentBody<'a> {
    title: &'a str,
    max_score: f64,
}

#[derive(Serialize)]
struct RecordScoreBody {
    score: f64,
}

impl HttpCourseApi {
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/courses{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CourseApi for HttpCourseApi {
    async fn create_course(
        &self,
        credential: &Credential,
        title: &str,
        code: &str,
        semester: Option<&str>,
    ) -> Result<CourseWire, ApiError> {
        let request = self
            .client
            .post(self.url(""))
            .bearer_auth(credential.token())
            .json(&CreateCourseBody {
                title,
                code,
                semester,
            });
        self.execute(request).await
    }

    async fn fetch_course(
        &self,
        credential: &Credential,
        course: CourseId,
    ) -> Result<CourseWire, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/{course}")))
            .bearer_auth(credential.token());
        self.execute(request).await
    }

    async fn list_courses(&self, credential: &Credential) -> Result<Vec<CourseWire>, ApiError> {
        let request = self
            .client
            .get(self.url(""))
            .bearer_auth(credential.token());
        self.execute(request).await
    }

    async fn add_item(
        &self,
        credential: &Credential,
        course: CourseId,
        category: ItemCategory,
        title: &str,
    ) -> Result<CourseWire, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/{course}/{category}")))
            .bearer_auth(credential.token())
            .json(&AddItemBody { title });
        self.execute(request).await
    }

    async fn add_assessment(
        &self,
        credential: &Credential,
        course: CourseId,
        title: &str,
        max_score: f64,
    ) -> Result<CourseWire, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/{course}/assessment")))
            .bearer_auth(credential.token())
            .json(&AddAssessmentBody { title, max_score });
        self.execute(request).await
    }

    async fn toggle_item(
        &self,
        credential: &Credential,
        course: CourseId,
        category: ItemCategory,
        item: ItemId,
    ) -> Result<CourseWire, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/{course}/{category}/{item}/toggle")))
            .bearer_auth(credential.token());
        self.execute(request).await
    }

    async fn record_score(
        &self,
        credential: &Credential,
        course: CourseId,
        assessment: AssessmentId,
        score: f64,
    ) -> Result<CourseWire, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/{course}/assessment/{assessment}")))
            .bearer_auth(credential.token())
            .json(&RecordScoreBody { score });
        self.execute(request).await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
