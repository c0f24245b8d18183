use crate::error::ValidationError;
use crate::model::ids::AssessmentId;

/// A gradable entry scored out of a fixed maximum.
///
/// `score` stays `None` until the first grading action; re-grading overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    id: AssessmentId,
    title: String,
    max_score: f64,
    score: Option<f64>,
}

impl Assessment {
    /// Creates a new, ungraded assessment.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyAssessmentTitle` for a blank title and
    /// `ValidationError::InvalidMaxScore` if `max_score` is not positive and
    /// finite.
    pub fn new(
        id: AssessmentId,
        title: impl Into<String>,
        max_score: f64,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyAssessmentTitle);
        }
        if !max_score.is_finite() || max_score <= 0.0 {
            return Err(ValidationError::InvalidMaxScore(max_score));
        }
        Ok(Self {
            id,
            title: title.to_owned(),
            max_score,
            score: None,
        })
    }

    /// Rebuilds an assessment from authoritative server state.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if title, max score, or score fail the same
    /// checks as `new` and `record_score`.
    pub fn from_persisted(
        id: AssessmentId,
        title: impl Into<String>,
        max_score: f64,
        score: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let mut assessment = Self::new(id, title, max_score)?;
        if let Some(score) = score {
            assessment.record_score(score)?;
        }
        Ok(assessment)
    }

    /// Records a grade, overwriting any prior one.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ScoreOutOfRange` if the score is negative,
    /// non-finite, or above `max_score`. State is untouched on error.
    pub fn record_score(&mut self, score: f64) -> Result<(), ValidationError> {
        if !score.is_finite() || score < 0.0 || score > self.max_score {
            return Err(ValidationError::ScoreOutOfRange {
                score,
                max_score: self.max_score,
            });
        }
        self.score = Some(score);
        Ok(())
    }

    /// Whether a grade has been recorded.
    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.score.is_some()
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> AssessmentId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    #[must_use]
    pub fn score(&self) -> Option<f64> {
        self.score
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
