mod assessment;
mod course;
mod ids;
mod insights;
mod item;

pub use assessment::Assessment;
pub use course::Course;
pub use ids::{AssessmentId, CourseId, ItemId};
pub use insights::CourseInsights;
pub use item::{ContentItem, ItemCategory};
