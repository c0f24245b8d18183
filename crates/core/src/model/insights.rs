use crate::error::ValidationError;

/// Cognitive indicators attached to a course by the external scorer.
///
/// The core never derives these; they ride along with the course and are
/// replaced wholesale whenever the server responds. The only shape guarantee
/// is presence/absence plus the 0–100 range of the numeric indicators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CourseInsights {
    lli: Option<u8>,
    smi: Option<u8>,
    mrs: Option<u8>,
    fatigue: Option<u8>,
    recommendation: Option<String>,
}

impl CourseInsights {
    /// Builds an indicator set, bounding each numeric value to 0..=100.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::IndicatorOutOfRange` for any value above 100.
    pub fn new(
        lli: Option<u8>,
        smi: Option<u8>,
        mrs: Option<u8>,
        fatigue: Option<u8>,
        recommendation: Option<String>,
    ) -> Result<Self, ValidationError> {
        for value in [lli, smi, mrs, fatigue].into_iter().flatten() {
            if value > 100 {
                return Err(ValidationError::IndicatorOutOfRange(value));
            }
        }
        let recommendation = recommendation
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());
        Ok(Self {
            lli,
            smi,
            mrs,
            fatigue,
            recommendation,
        })
    }

    /// True when the scorer has not attached any indicator yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lli.is_none()
            && self.smi.is_none()
            && self.mrs.is_none()
            && self.fatigue.is_none()
            && self.recommendation.is_none()
    }

    // Accessors
    #[must_use]
    pub fn lli(&self) -> Option<u8> {
        self.lli
    }

    #[must_use]
    pub fn smi(&self) -> Option<u8> {
        self.smi
    }

    #[must_use]
    pub fn mrs(&self) -> Option<u8> {
        self.mrs
    }

    #[must_use]
    pub fn fatigue(&self) -> Option<u8> {
        self.fatigue
    }

    #[must_use]
    pub fn recommendation(&self) -> Option<&str> {
        self.recommendation.as_deref()
    }
}
