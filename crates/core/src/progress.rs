//! Course progress aggregation.
//!
//! Each non-empty toggleable category (lessons, modules, labs) contributes a
//! completion ratio; graded assessments contribute `sum(score)/sum(max_score)`.
//! The overall percent is the plain mean of whichever ratios are present, so
//! a section with many entries cannot swamp a small high-stakes one. Empty
//! categories and ungraded assessments are excluded from both sides of the
//! ratio rather than counted as 0% or 100%.

use crate::model::{Assessment, ContentItem};

/// Completion ratio for one toggleable category.
///
/// Returns `None` for an empty category so it drops out of the mean.
#[must_use]
pub fn completion_ratio(items: &[ContentItem]) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let done = items.iter().filter(|item| item.completed()).count();
    #[allow(clippy::cast_precision_loss)]
    Some(done as f64 / items.len() as f64)
}

/// Score ratio over graded assessments only.
///
/// Ungraded assessments are excluded from numerator and denominator; returns
/// `None` when nothing has been graded yet.
#[must_use]
pub fn assessment_ratio(assessments: &[Assessment]) -> Option<f64> {
    let graded: Vec<&Assessment> = assessments.iter().filter(|a| a.is_graded()).collect();
    if graded.is_empty() {
        return None;
    }
    let total: f64 = graded.iter().filter_map(|a| a.score()).sum();
    let max_total: f64 = graded.iter().map(|a| a.max_score()).sum();
    Some(total / max_total)
}

/// Overall progress for a course, as an integer percent 0–100.
///
/// A course with no items in any category and no graded assessments is 0.
#[must_use]
pub fn progress_percent(
    lessons: &[ContentItem],
    modules: &[ContentItem],
    labs: &[ContentItem],
    assessments: &[Assessment],
) -> u8 {
    let ratios: Vec<f64> = [
        completion_ratio(lessons),
        completion_ratio(modules),
        completion_ratio(labs),
        assessment_ratio(assessments),
    ]
    .into_iter()
    .flatten()
    .collect();

    if ratios.is_empty() {
        return 0;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = (mean * 100.0).round().clamp(0.0, 100.0) as u8;
    percent
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssessmentId, ItemId};

    fn item(id: u64, title: &str, completed: bool) -> ContentItem {
        ContentItem::from_persisted(ItemId::new(id), title, completed).unwrap()
    }

    fn graded(id: u64, score: f64, max: f64) -> Assessment {
        Assessment::from_persisted(AssessmentId::new(id), format!("A{id}"), max, Some(score))
            .unwrap()
    }

    fn ungraded(id: u64, max: f64) -> Assessment {
        Assessment::new(AssessmentId::new(id), format!("A{id}"), max).unwrap()
    }

    #[test]
    fn empty_course_is_zero() {
        assert_eq!(progress_percent(&[], &[], &[], &[]), 0);
    }

    #[test]
    fn empty_category_drops_out_of_the_mean() {
        // 2 lessons (1 done) and nothing else: 50%, not dragged down by
        // empty modules/labs.
        let lessons = vec![item(1, "a", true), item(2, "b", false)];
        assert_eq!(progress_percent(&lessons, &[], &[], &[]), 50);
    }

    #[test]
    fn worked_example_half_lessons_and_eighty_percent_assessment() {
        // 2 lessons (1 done) + one graded 8/10: round((50 + 80) / 2) = 65.
        let lessons = vec![item(1, "a", true), item(2, "b", false)];
        let assessments = vec![graded(1, 8.0, 10.0)];
        assert_eq!(progress_percent(&lessons, &[], &[], &assessments), 65);
    }

    #[test]
    fn ungraded_assessments_are_excluded() {
        let lessons = vec![item(1, "a", true)];
        let assessments = vec![ungraded(1, 10.0), ungraded(2, 50.0)];
        // Only the lesson ratio is present.
        assert_eq!(progress_percent(&lessons, &[], &[], &assessments), 100);
        assert_eq!(assessment_ratio(&assessments), None);
    }

    #[test]
    fn assessment_ratio_pools_graded_scores() {
        let assessments = vec![graded(1, 8.0, 10.0), graded(2, 20.0, 40.0), ungraded(3, 10.0)];
        // (8 + 20) / (10 + 40) = 0.56
        let ratio = assessment_ratio(&assessments).unwrap();
        assert!((ratio - 0.56).abs() < 1e-9);
    }

    #[test]
    fn all_sections_present_weigh_equally() {
        let lessons = vec![item(1, "a", true), item(2, "b", true)];
        let modules = vec![item(1, "m", false)];
        let labs = vec![item(1, "l", true), item(2, "l2", false)];
        let assessments = vec![graded(1, 5.0, 10.0)];
        // (100 + 0 + 50 + 50) / 4 = 50
        assert_eq!(progress_percent(&lessons, &modules, &labs, &assessments), 50);
    }

    #[test]
    fn percent_is_bounded_and_pure() {
        let lessons = vec![item(1, "a", true)];
        let assessments = vec![graded(1, 10.0, 10.0)];
        let first = progress_percent(&lessons, &[], &[], &assessments);
        let second = progress_percent(&lessons, &[], &[], &assessments);
        assert_eq!(first, 100);
        assert_eq!(first, second);
    }

    #[test]
    fn rounding_is_to_nearest_integer() {
        // 1 of 3 lessons: 33.33 -> 33.
        let lessons = vec![item(1, "a", true), item(2, "b", false), item(3, "c", false)];
        assert_eq!(progress_percent(&lessons, &[], &[], &[]), 33);

        // 2 of 3 lessons: 66.67 -> 67.
        let lessons = vec![item(1, "a", true), item(2, "b", true), item(3, "c", false)];
        assert_eq!(progress_percent(&lessons, &[], &[], &[]), 67);
    }
}
