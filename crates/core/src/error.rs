use thiserror::Error;

use crate::model::{AssessmentId, CourseId, ItemCategory, ItemId};

/// Malformed input rejected before any state changes.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course code cannot be empty")]
    EmptyCode,

    #[error("item title cannot be empty")]
    EmptyItemTitle,

    #[error("assessment title cannot be empty")]
    EmptyAssessmentTitle,

    #[error("max score must be positive and finite, got {0}")]
    InvalidMaxScore(f64),

    #[error("score {score} is outside [0, {max_score}]")]
    ScoreOutOfRange { score: f64, max_score: f64 },

    #[error("cognitive indicator must be within 0..=100, got {0}")]
    IndicatorOutOfRange(u8),

    #[error("progress percent must be within 0..=100, got {0}")]
    ProgressOutOfRange(u8),
}

/// Lookup of an unknown course, item, or assessment.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundError {
    #[error("course {0} not found")]
    Course(CourseId),

    #[error("{category} item {id} not found")]
    Item { category: ItemCategory, id: ItemId },

    #[error("assessment {0} not found")]
    Assessment(AssessmentId),
}

/// Any domain failure raised by the course aggregate.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CourseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}
