mod common;

use common::{PASSWORD, setup, student, teacher};
use database::{
    ServiceError,
    services::{
        classes::ClassService,
        users::{LinkOutcome, NewUser, UserChanges, UserService},
    },
};
use models::{Profile, Role};
use test_log::test;

#[test(tokio::test)]
async fn test_register_then_authenticate() {
    let test_db = setup().await;
    let db = &test_db.db;

    let registered = student(db, "Ada Lovelace", "9", "A").await;
    assert_eq!(registered.account.email, "ada.lovelace@school.test");
    assert_ne!(registered.account.password_hash, PASSWORD);

    let before = UserService::get(db, registered.account.id).await.unwrap();
    let account = UserService::authenticate(db, "ADA.lovelace@school.test", PASSWORD)
        .await
        .unwrap();
    assert_eq!(account.id, registered.account.id);
    assert_eq!(account.role, Role::Student);

    // authenticate leaves the account untouched
    let after = UserService::get(db, registered.account.id).await.unwrap();
    assert_eq!(before, after);
}

#[test(tokio::test)]
async fn test_authenticate_failures_look_alike() {
    let test_db = setup().await;
    let db = &test_db.db;
    student(db, "Ada Lovelace", "9", "A").await;

    let wrong_password = UserService::authenticate(db, "ada.lovelace@school.test", "nope").await;
    assert!(matches!(wrong_password, Err(ServiceError::InvalidCredentials)));

    let unknown = UserService::authenticate(db, "nobody@school.test", PASSWORD).await;
    assert!(matches!(unknown, Err(ServiceError::InvalidCredentials)));
}

#[test(tokio::test)]
async fn test_duplicate_email_conflicts() {
    let test_db = setup().await;
    let db = &test_db.db;
    student(db, "Ada Lovelace", "9", "A").await;

    let result = UserService::register(
        db,
        NewUser {
            email: " Ada.Lovelace@School.test ".to_string(),
            full_name: "Someone Else".to_string(),
            password: PASSWORD.to_string(),
            contact: None,
            is_active: true,
            profile: Profile::empty(Role::Admin),
        },
    )
    .await;

    assert!(matches!(result, Err(ServiceError::Conflict(_))));
    assert_eq!(UserService::list(db, None).await.unwrap().len(), 1);
}

#[test(tokio::test)]
async fn test_profile_fields_follow_role() {
    let test_db = setup().await;
    let db = &test_db.db;
    let ada = student(db, "Ada Lovelace", "9", "A").await;

    let result = UserService::update(
        db,
        ada.account.id,
        Some(Role::Student),
        UserChanges {
            subject: Some("Physics".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let updated = UserService::update(
        db,
        ada.account.id,
        Some(Role::Student),
        UserChanges {
            section: Some("B".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.student().unwrap().section.as_deref(), Some("B"));
    assert_eq!(updated.student().unwrap().grade.as_deref(), Some("9"));

    // a student id is not a teacher
    let result = UserService::get_with_role(db, ada.account.id, Role::Teacher).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[test(tokio::test)]
async fn test_parent_link_and_unlink() {
    let test_db = setup().await;
    let db = &test_db.db;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let mum = common::register(db, "Anne Byron", Profile::Parent).await;
    let dad = common::register(db, "George Byron", Profile::Parent).await;

    let outcome = UserService::link_student(db, mum.account.id, ada.account.id)
        .await
        .unwrap();
    assert_eq!(outcome, LinkOutcome::Linked { previous_parent: None });

    let outcome = UserService::link_student(db, mum.account.id, ada.account.id)
        .await
        .unwrap();
    assert_eq!(outcome, LinkOutcome::AlreadyLinked);

    let outcome = UserService::link_student(db, dad.account.id, ada.account.id)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        LinkOutcome::Linked {
            previous_parent: Some(mum.account.id)
        }
    );
    assert!(UserService::parent_students(db, mum.account.id).await.unwrap().is_empty());
    assert_eq!(UserService::parent_students(db, dad.account.id).await.unwrap().len(), 1);

    assert!(UserService::unlink_student(db, dad.account.id, ada.account.id).await.unwrap());
    assert!(!UserService::unlink_student(db, dad.account.id, ada.account.id).await.unwrap());
}

#[test(tokio::test)]
async fn test_teacher_with_classes_cannot_be_deleted() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let class = common::class(db, &grace, "Algebra 9A", "9", "A", 30).await;

    let result = UserService::delete(db, grace.account.id, Some(Role::Teacher)).await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));

    ClassService::delete(db, class.id).await.unwrap();
    UserService::delete(db, grace.account.id, Some(Role::Teacher))
        .await
        .unwrap();
}

#[test(tokio::test)]
async fn test_teacher_subject_filled_from_first_class() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    common::class(db, &grace, "Algebra 9A", "9", "A", 30).await;

    let profile = UserService::teacher_profile(db, grace.account.id).await.unwrap();
    assert_eq!(
        profile.profile.as_teacher().unwrap().subject.as_deref(),
        Some("Mathematics")
    );

    // persisted
    let reloaded = UserService::get(db, grace.account.id).await.unwrap();
    assert_eq!(reloaded.profile, profile.profile);
}
