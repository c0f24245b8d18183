//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;
use twin_core::error::{CourseError, NotFoundError, ValidationError};

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error(transparent)]
    Course(#[from] CourseError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ValidationError> for CourseServiceError {
    fn from(err: ValidationError) -> Self {
        Self::Course(err.into())
    }
}

impl From<NotFoundError> for CourseServiceError {
    fn from(err: NotFoundError) -> Self {
        Self::Course(err.into())
    }
}

/// A single failed exchange with the course backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response payload: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Transport failures and 408/429/5xx are worth retrying; other statuses
    /// and undecodable payloads are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => {
                matches!(status.as_u16(), 408 | 429 | 500..=599)
            }
            Self::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// The remote side of a sync could not be completed.
///
/// By the time this surfaces, any optimistic local change has already been
/// reverted.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("remote call failed after {attempts} attempt(s): {source}")]
    Remote {
        attempts: u32,
        #[source]
        source: ApiError,
    },

    #[error("server response could not be applied: {0}")]
    InvalidResponse(#[source] ValidationError),
}

/// Any failure raised by `SyncClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncClientError {
    /// Local validation or lookup failure; never sent to the server and
    /// never retried.
    #[error(transparent)]
    Course(#[from] CourseError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
