#![forbid(unsafe_code)]

pub mod course_service;
pub mod error;
pub mod sync;

pub use twin_core::Clock;

pub use course_service::CourseService;
pub use error::{ApiError, CourseServiceError, SyncClientError, SyncError};
pub use sync::{
    CourseApi, CourseMutation, Credential, HttpApiConfig, HttpCourseApi, LocalCourseView,
    RetryPolicy, SyncClient,
};
