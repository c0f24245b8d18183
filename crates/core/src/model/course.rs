use chrono::{DateTime, Utc};

use crate::error::{CourseError, NotFoundError, ValidationError};
use crate::model::{
    Assessment, AssessmentId, ContentItem, CourseId, CourseInsights, ItemCategory, ItemId,
};
use crate::progress;

/// The root learning-content aggregate.
///
/// Owns the three toggleable item collections plus assessments, and keeps two
/// derived values in lockstep with them: `progress_percent`, recomputed inside
/// every mutating method, and `version`, bumped by every mutation so storage
/// can commit with compare-and-set. Neither is settable from outside.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    code: String,
    semester: Option<String>,
    lessons: Vec<ContentItem>,
    modules: Vec<ContentItem>,
    labs: Vec<ContentItem>,
    assessments: Vec<Assessment>,
    progress_percent: u8,
    version: u64,
    insights: CourseInsights,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates an empty course.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyTitle` or `ValidationError::EmptyCode`
    /// when either field is blank.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        code: impl Into<String>,
        semester: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let code = code.into();
        let code = code.trim();
        if code.is_empty() {
            return Err(ValidationError::EmptyCode);
        }
        let semester = semester
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());

        Ok(Self {
            id,
            title: title.to_owned(),
            code: code.to_owned(),
            semester,
            lessons: Vec::new(),
            modules: Vec::new(),
            labs: Vec::new(),
            assessments: Vec::new(),
            progress_percent: 0,
            version: 0,
            insights: CourseInsights::default(),
            created_at,
        })
    }

    /// Rebuilds a course from authoritative server state.
    ///
    /// The given `progress_percent` and `version` are kept as-is: the server
    /// owns both, and its progress formula may differ from the local one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any field fails the creation-time checks
    /// or `progress_percent` exceeds 100.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CourseId,
        title: impl Into<String>,
        code: impl Into<String>,
        semester: Option<String>,
        lessons: Vec<ContentItem>,
        modules: Vec<ContentItem>,
        labs: Vec<ContentItem>,
        assessments: Vec<Assessment>,
        progress_percent: u8,
        version: u64,
        insights: CourseInsights,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if progress_percent > 100 {
            return Err(ValidationError::ProgressOutOfRange(progress_percent));
        }
        let mut course = Self::new(id, title, code, semester, created_at)?;
        course.lessons = lessons;
        course.modules = modules;
        course.labs = labs;
        course.assessments = assessments;
        course.progress_percent = progress_percent;
        course.version = version;
        course.insights = insights;
        Ok(course)
    }

    /// Returns the same course under a different id.
    ///
    /// Used by storage adapters when they assign the persistent id.
    #[must_use]
    pub fn with_id(mut self, id: CourseId) -> Self {
        self.id = id;
        self
    }

    //
    // ─── MUTATIONS ─────────────────────────────────────────────────────────
    //

    /// Adds an item to the given category and returns its id.
    ///
    /// Ids are allocated monotonically per category (max + 1), so they stay
    /// unique within that category for the life of the course.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyItemTitle` for a blank title.
    pub fn add_item(
        &mut self,
        category: ItemCategory,
        title: impl Into<String>,
    ) -> Result<ItemId, ValidationError> {
        let id = next_id(self.items(category).iter().map(ContentItem::id));
        let item = ContentItem::new(id, title)?;
        self.items_mut(category).push(item);
        self.touch();
        Ok(id)
    }

    /// Adds an ungraded assessment and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank title or non-positive max score.
    pub fn add_assessment(
        &mut self,
        title: impl Into<String>,
        max_score: f64,
    ) -> Result<AssessmentId, ValidationError> {
        let id = AssessmentId::new(
            self.assessments
                .iter()
                .map(|a| a.id().value())
                .max()
                .unwrap_or(0)
                .saturating_add(1),
        );
        let assessment = Assessment::new(id, title, max_score)?;
        self.assessments.push(assessment);
        self.touch();
        Ok(id)
    }

    /// Flips one item's completion flag and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError::Item` if no item with that id exists under the
    /// category.
    pub fn toggle_item(
        &mut self,
        category: ItemCategory,
        id: ItemId,
    ) -> Result<bool, NotFoundError> {
        let item = self
            .items_mut(category)
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(NotFoundError::Item { category, id })?;
        let completed = item.toggle();
        self.touch();
        Ok(completed)
    }

    /// Records a grade on an assessment, overwriting any prior one.
    ///
    /// # Errors
    ///
    /// Returns `NotFoundError::Assessment` for an unknown id and
    /// `ValidationError::ScoreOutOfRange` for an invalid score; the course is
    /// unchanged on either failure.
    pub fn record_score(&mut self, id: AssessmentId, score: f64) -> Result<(), CourseError> {
        let assessment = self
            .assessments
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(NotFoundError::Assessment(id))?;
        assessment.record_score(score)?;
        self.touch();
        Ok(())
    }

    /// Replaces the attached cognitive indicators.
    ///
    /// Indicators come from the external scorer, not from a client mutation,
    /// so this does not bump the version counter.
    pub fn set_insights(&mut self, insights: CourseInsights) {
        self.insights = insights;
    }

    fn touch(&mut self) {
        self.version += 1;
        self.progress_percent = progress::progress_percent(
            &self.lessons,
            &self.modules,
            &self.labs,
            &self.assessments,
        );
    }

    //
    // ─── LOOKUPS & ACCESSORS ───────────────────────────────────────────────
    //

    /// Items of one category, in insertion order.
    #[must_use]
    pub fn items(&self, category: ItemCategory) -> &[ContentItem] {
        match category {
            ItemCategory::Lesson => &self.lessons,
            ItemCategory::Module => &self.modules,
            ItemCategory::Lab => &self.labs,
        }
    }

    fn items_mut(&mut self, category: ItemCategory) -> &mut Vec<ContentItem> {
        match category {
            ItemCategory::Lesson => &mut self.lessons,
            ItemCategory::Module => &mut self.modules,
            ItemCategory::Lab => &mut self.labs,
        }
    }

    #[must_use]
    pub fn item(&self, category: ItemCategory, id: ItemId) -> Option<&ContentItem> {
        self.items(category).iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn assessment(&self, id: AssessmentId) -> Option<&Assessment> {
        self.assessments.iter().find(|a| a.id() == id)
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn semester(&self) -> Option<&str> {
        self.semester.as_deref()
    }

    #[must_use]
    pub fn lessons(&self) -> &[ContentItem] {
        &self.lessons
    }

    #[must_use]
    pub fn modules(&self) -> &[ContentItem] {
        &self.modules
    }

    #[must_use]
    pub fn labs(&self) -> &[ContentItem] {
        &self.labs
    }

    #[must_use]
    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Mutation counter used as the compare-and-set token by storage.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn insights(&self) -> &CourseInsights {
        &self.insights
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// Saturates so a server document carrying u64::MAX cannot panic the
// allocator; the duplicate id that would follow is the server's bug to own.
fn next_id(ids: impl Iterator<Item = ItemId>) -> ItemId {
    ItemId::new(ids.map(|id| id.value()).max().unwrap_or(0).saturating_add(1))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
