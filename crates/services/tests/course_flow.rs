//! End-to-end flows through `CourseService` with an in-memory repository.

use std::sync::Arc;

use services::{CourseService, CourseServiceError};
use storage::InMemoryRepository;
use twin_core::error::{CourseError, ValidationError};
use twin_core::model::{CourseId, ItemCategory, ItemId};
use twin_core::time::fixed_clock;

fn service() -> CourseService {
    CourseService::new(fixed_clock(), Arc::new(InMemoryRepository::new()))
}

#[tokio::test]
async fn full_course_lifecycle() {
    let service = service();

    let course = service
        .create_course("Algorithms".into(), "CS301".into(), Some("Fall 2025".into()))
        .await
        .unwrap();
    assert_eq!(course.progress_percent(), 0);
    assert_eq!(course.version(), 0);

    service
        .add_item(course.id(), ItemCategory::Lesson, "Arrays".into())
        .await
        .unwrap();
    service
        .add_item(course.id(), ItemCategory::Lesson, "Linked lists".into())
        .await
        .unwrap();
    let with_quiz = service
        .add_assessment(course.id(), "Quiz 1".into(), 10.0)
        .await
        .unwrap();
    let quiz = with_quiz.assessments()[0].id();

    // Empty categories do not drag progress down.
    assert_eq!(with_quiz.progress_percent(), 0);

    service
        .toggle_item(course.id(), ItemCategory::Lesson, ItemId::new(1))
        .await
        .unwrap();
    let course = service.record_score(course.id(), quiz, 8.0).await.unwrap();

    // Half the lessons done, 8/10 on the only graded assessment: 65%.
    assert_eq!(course.progress_percent(), 65);
    assert_eq!(course.version(), 5);
}

#[tokio::test]
async fn listing_returns_courses_in_creation_order() {
    let service = service();
    let first = service
        .create_course("Algorithms".into(), "CS301".into(), None)
        .await
        .unwrap();
    let second = service
        .create_course("Databases".into(), "CS305".into(), None)
        .await
        .unwrap();

    let all = service.list_courses().await.unwrap();
    assert_eq!(
        all.iter().map(|c| c.id()).collect::<Vec<_>>(),
        vec![first.id(), second.id()]
    );
}

#[tokio::test]
async fn rejected_score_leaves_the_store_untouched() {
    let service = service();
    let course = service
        .create_course("Algorithms".into(), "CS301".into(), None)
        .await
        .unwrap();
    let course = service
        .add_assessment(course.id(), "Final".into(), 100.0)
        .await
        .unwrap();
    let final_exam = course.assessments()[0].id();

    let err = service
        .record_score(course.id(), final_exam, -1.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CourseServiceError::Course(CourseError::Validation(
            ValidationError::ScoreOutOfRange { .. }
        ))
    ));

    let stored = service.get_course(course.id()).await.unwrap();
    assert!(!stored.assessment(final_exam).unwrap().is_graded());
    assert_eq!(stored.version(), course.version());
    assert_eq!(stored.progress_percent(), 0);
}

#[tokio::test]
async fn toggling_twice_restores_the_original_state() {
    let service = service();
    let course = service
        .create_course("Algorithms".into(), "CS301".into(), None)
        .await
        .unwrap();
    service
        .add_item(course.id(), ItemCategory::Module, "Sorting".into())
        .await
        .unwrap();

    service
        .toggle_item(course.id(), ItemCategory::Module, ItemId::new(1))
        .await
        .unwrap();
    let restored = service
        .toggle_item(course.id(), ItemCategory::Module, ItemId::new(1))
        .await
        .unwrap();

    assert!(
        !restored
            .item(ItemCategory::Module, ItemId::new(1))
            .unwrap()
            .completed()
    );
    assert_eq!(restored.progress_percent(), 0);
}

#[tokio::test]
async fn replayed_toggle_applies_once() {
    let service = service();
    let course = service
        .create_course("Algorithms".into(), "CS301".into(), None)
        .await
        .unwrap();
    service
        .add_item(course.id(), ItemCategory::Lab, "Lab 1".into())
        .await
        .unwrap();

    // Both requests were formed while the lab was still incomplete.
    let first = service
        .toggle_item_from(course.id(), ItemCategory::Lab, ItemId::new(1), false)
        .await
        .unwrap();
    let replay = service
        .toggle_item_from(course.id(), ItemCategory::Lab, ItemId::new(1), false)
        .await
        .unwrap();

    assert!(
        replay
            .item(ItemCategory::Lab, ItemId::new(1))
            .unwrap()
            .completed()
    );
    assert_eq!(replay.version(), first.version());
    assert_eq!(replay.progress_percent(), 100);
}

#[tokio::test]
async fn unknown_course_is_reported_as_such() {
    let service = service();
    let err = service.get_course(CourseId::new(42)).await.unwrap_err();
    assert!(matches!(
        err,
        CourseServiceError::Course(CourseError::NotFound(_))
    ));
}
