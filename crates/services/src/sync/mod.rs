//! Optimistic client for a remote course API.
//!
//! Mutations apply to the local course first, then go out over HTTP with
//! bounded retry. The server reply replaces the local course; on failure the
//! local change is rolled back to the pre-mutation snapshot.

mod api;
mod client;
mod http;
mod retry;
mod wire;

pub use api::{CourseApi, Credential};
pub use client::{CourseMutation, LocalCourseView, SyncClient};
pub use http::{HttpApiConfig, HttpCourseApi};
pub use retry::RetryPolicy;
pub use wire::{AssessmentWire, CourseWire, ItemWire};
