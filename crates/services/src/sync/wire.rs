use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use twin_core::error::ValidationError;
use twin_core::model::{
    Assessment, AssessmentId, ContentItem, Course, CourseId, CourseInsights, ItemId,
};

/// A toggleable content item as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemWire {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// A graded (or not yet graded) assessment as it travels over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentWire {
    pub id: u64,
    pub title: String,
    pub score: Option<f64>,
    pub max_score: f64,
}

/// The course document exchanged with the server.
///
/// `progress_percent` and `version` are server-derived; the client never
/// computes them into this struct except when echoing a locally held course.
/// Insight indicators are optional and omitted when absent, matching servers
/// that only attach them once a scoring pass has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseWire {
    pub id: u64,
    pub title: String,
    pub code: String,
    #[serde(default)]
    pub semester: Option<String>,
    pub progress_percent: u8,
    pub lessons: Vec<ItemWire>,
    pub modules: Vec<ItemWire>,
    pub labs: Vec<ItemWire>,
    pub assessments: Vec<AssessmentWire>,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lli: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smi: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrs: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatigue: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl CourseWire {
    /// Validates the wire document into a domain course.
    ///
    /// `received_at` stands in for a missing `created_at`, so a server that
    /// does not echo creation time still yields a usable course.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when the document carries values the domain
    /// rejects (blank titles, out-of-range scores or indicators).
    pub fn into_course(self, received_at: DateTime<Utc>) -> Result<Course, ValidationError> {
        let lessons = wire_items(self.lessons)?;
        let modules = wire_items(self.modules)?;
        let labs = wire_items(self.labs)?;
        let assessments = self
            .assessments
            .into_iter()
            .map(|a| Assessment::from_persisted(AssessmentId::new(a.id), a.title, a.max_score, a.score))
            .collect::<Result<Vec<_>, _>>()?;
        let insights =
            CourseInsights::new(self.lli, self.smi, self.mrs, self.fatigue, self.recommendation)?;

        Course::from_persisted(
            CourseId::new(self.id),
            self.title,
            self.code,
            self.semester,
            lessons,
            modules,
            labs,
            assessments,
            self.progress_percent,
            self.version,
            insights,
            self.created_at.unwrap_or(received_at),
        )
    }

    /// Serializes a domain course back into its wire shape.
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        let insights = course.insights();
        Self {
            id: course.id().value(),
            title: course.title().to_owned(),
            code: course.code().to_owned(),
            semester: course.semester().map(str::to_owned),
            progress_percent: course.progress_percent(),
            lessons: course.lessons().iter().map(item_wire).collect(),
            modules: course.modules().iter().map(item_wire).collect(),
            labs: course.labs().iter().map(item_wire).collect(),
            assessments: course
                .assessments()
                .iter()
                .map(|a| AssessmentWire {
                    id: a.id().value(),
                    title: a.title().to_owned(),
                    score: a.score(),
                    max_score: a.max_score(),
                })
                .collect(),
            version: course.version(),
            lli: insights.lli(),
            smi: insights.smi(),
            mrs: insights.mrs(),
            fatigue: insights.fatigue(),
            recommendation: insights.recommendation().map(str::to_owned),
            created_at: Some(course.created_at()),
        }
    }
}

fn item_wire(item: &ContentItem) -> ItemWire {
    ItemWire {
        id: item.id().value(),
        title: item.title().to_owned(),
        completed: item.completed(),
    }
}

fn wire_items(items: Vec<ItemWire>) -> Result<Vec<ContentItem>, ValidationError> {
    items
        .into_iter()
        .map(|i| ContentItem::from_persisted(ItemId::new(i.id), i.title, i.completed))
        .collect()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
