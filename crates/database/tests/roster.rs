mod common;

use common::{class, setup, student, teacher};
use database::{
    ServiceError,
    services::{
        classes::{ClassChanges, ClassService},
        roster::{Promotion, RosterService},
    },
};
use models::status::EnrollmentStatus;
use test_log::test;

#[test(tokio::test)]
async fn test_enroll_rejects_batch_over_capacity() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 2).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;
    let kurt = student(db, "Kurt Godel", "9", "A").await;

    RosterService::enroll(db, algebra.id, &[ada.account.id, alan.account.id])
        .await
        .unwrap();
    assert_eq!(ClassService::active_count(db, algebra.id).await.unwrap(), 2);

    let result = RosterService::enroll(db, algebra.id, &[kurt.account.id]).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(ClassService::active_count(db, algebra.id).await.unwrap(), 2);

    let detail = ClassService::get(db, algebra.id).await.unwrap();
    assert_eq!(detail.current_students(), 2);
}

#[test(tokio::test)]
async fn test_enroll_is_all_or_nothing() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 10).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;

    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    // alan would fit but ada is already enrolled
    let result = RosterService::enroll(db, algebra.id, &[alan.account.id, ada.account.id]).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(ClassService::active_count(db, algebra.id).await.unwrap(), 1);

    // a teacher is not a student
    let result = RosterService::enroll(db, algebra.id, &[grace.account.id]).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[test(tokio::test)]
async fn test_drop_student() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 2).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;

    RosterService::enroll(db, algebra.id, &[ada.account.id, alan.account.id])
        .await
        .unwrap();

    let dropped = RosterService::drop_student(db, algebra.id, ada.account.id)
        .await
        .unwrap();
    assert_eq!(dropped.status, EnrollmentStatus::Dropped);
    assert_eq!(ClassService::active_count(db, algebra.id).await.unwrap(), 1);

    let students = RosterService::class_students(db, algebra.id).await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].student.account.id, alan.account.id);

    // a dropped enrollment cannot be dropped again
    let result = RosterService::drop_student(db, algebra.id, ada.account.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound("enrollment"))));

    // the freed seat can be taken again
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();
    assert_eq!(ClassService::active_count(db, algebra.id).await.unwrap(), 2);
}

#[test(tokio::test)]
async fn test_capacity_cannot_drop_below_enrolled() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 5).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id, alan.account.id])
        .await
        .unwrap();

    let result = ClassService::update(
        db,
        algebra.id,
        ClassChanges {
            capacity: Some(1),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let duplicate = ClassService::update(
        db,
        class(db, &grace, "Geometry 9A", "9", "A", 5).await.id,
        ClassChanges {
            name: Some("Algebra 9A".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(duplicate, Err(ServiceError::Conflict(_))));
}

#[test(tokio::test)]
async fn test_promote_moves_students_and_enrollments() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let history = class(db, &grace, "History 9A", "9", "A", 30).await;
    let calculus = class(db, &grace, "Calculus 10A", "10", "A", 30).await;
    let physics = class(db, &grace, "Physics 10A", "10", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;
    let kurt = student(db, "Kurt Godel", "9", "B").await;

    let ids = [ada.account.id, alan.account.id];
    RosterService::enroll(db, algebra.id, &ids).await.unwrap();
    RosterService::enroll(db, history.id, &ids).await.unwrap();

    let promoted = RosterService::promote(
        db,
        Promotion {
            from_grade: "9".to_string(),
            from_section: "A".to_string(),
            to_grade: "10".to_string(),
            to_section: "A".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(promoted.len(), 2);
    for student in &promoted {
        let profile = student.student().unwrap();
        assert_eq!(profile.grade.as_deref(), Some("10"));
        assert_eq!(profile.section.as_deref(), Some("A"));
    }

    for id in ids {
        let mut classes: Vec<_> = RosterService::student_classes(db, id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        classes.sort();
        let mut expected = vec![calculus.id, physics.id];
        expected.sort();
        assert_eq!(classes, expected);
    }

    assert_eq!(ClassService::active_count(db, algebra.id).await.unwrap(), 0);
    assert_eq!(ClassService::active_count(db, history.id).await.unwrap(), 0);
    assert_eq!(ClassService::active_count(db, calculus.id).await.unwrap(), 2);

    // kurt is in another section and stays put
    let kurt = database::services::users::UserService::get(db, kurt.account.id)
        .await
        .unwrap();
    assert_eq!(kurt.student().unwrap().grade.as_deref(), Some("9"));

    let result = RosterService::promote(
        db,
        Promotion {
            from_grade: "9".to_string(),
            from_section: "A".to_string(),
            to_grade: "10".to_string(),
            to_section: "A".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
