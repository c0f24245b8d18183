use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::ids::ItemId;

//
// ─── CATEGORY ──────────────────────────────────────────────────────────────────
//

/// The three toggleable content sections of a course.
///
/// Assessments are a separate, gradable collection and are not a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Lesson,
    Module,
    Lab,
}

impl ItemCategory {
    /// The singular path segment used by the backend routes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lesson => "lesson",
            Self::Module => "module",
            Self::Lab => "lab",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── CONTENT ITEM ──────────────────────────────────────────────────────────────
//

/// A single lesson, module, or lab entry.
///
/// Title is fixed at creation; only the completion flag ever changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    id: ItemId,
    title: String,
    completed: bool,
}

impl ContentItem {
    /// Creates a new, not-yet-completed item.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyItemTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(id: ItemId, title: impl Into<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyItemTitle);
        }
        Ok(Self {
            id,
            title: title.to_owned(),
            completed: false,
        })
    }

    /// Rebuilds an item from authoritative server state.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyItemTitle` if the title is empty.
    pub fn from_persisted(
        id: ItemId,
        title: impl Into<String>,
        completed: bool,
    ) -> Result<Self, ValidationError> {
        let mut item = Self::new(id, title)?;
        item.completed = completed;
        Ok(item)
    }

    /// Flips the completion flag exactly once.
    ///
    /// Returns the new completion state.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
