mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::{class, setup, student, teacher};
use database::{
    ServiceError,
    entities::{assignment_submissions, grades},
    services::{
        assignments::{AssignmentChanges, AssignmentService, NewAssignment, Upload},
        attendance::{AttendanceEntry, AttendanceService},
        classes::{ClassChanges, ClassService},
        files::{SubmissionFiles, canonical_path},
        grades::{GradeInput, GradeService},
        reports::ReportService,
        roster::RosterService,
    },
};
use models::status::{
    AssignmentStatus, AttendanceStatus, ClassStatus, DisplayStatus, GradeStatus, SubmissionStatus,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
};
use test_log::test;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn upload(name: &str) -> Upload {
    Upload {
        filename: name.to_string(),
        bytes: b"print('hello')".to_vec(),
    }
}

fn new_assignment(class_id: uuid::Uuid, due_date: NaiveDate) -> NewAssignment {
    NewAssignment {
        title: "Quadratic equations".to_string(),
        description: Some("Exercises 1-10".to_string()),
        class_id,
        due_date,
        max_score: 100.0,
        status: AssignmentStatus::Active,
    }
}

#[test(tokio::test)]
async fn test_submit_twice_conflicts() {
    let test_db = setup().await;
    let db = &test_db.db;
    let files = SubmissionFiles::new(test_db.dir.path().join("uploads"));
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let assignment = AssignmentService::create(
        db,
        grace.account.id,
        new_assignment(algebra.id, today() + Duration::days(7)),
    )
    .await
    .unwrap();

    let first = AssignmentService::submit(
        db,
        &files,
        assignment.id,
        ada.account.id,
        upload("solution.py"),
        Some("first try".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(first.status, SubmissionStatus::Submitted);
    assert_eq!(
        first.file_path.as_deref(),
        Some(format!("assignments/assignments/submissions/{}_{}_solution.py", ada.account.id, assignment.id).as_str())
    );

    let second = AssignmentService::submit(
        db,
        &files,
        assignment.id,
        ada.account.id,
        upload("solution-v2.py"),
        None,
    )
    .await;
    assert!(matches!(second, Err(ServiceError::Conflict(_))));

    let stored = assignment_submissions::Entity::find()
        .filter(assignment_submissions::Column::AssignmentId.eq(assignment.id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, first.id);
    assert_eq!(stored[0].content.as_deref(), Some("first try"));

    // the teacher can fetch the file by its canonical path
    let requested = canonical_path(&format!("{}_{}_solution.py", ada.account.id, assignment.id)).unwrap();
    let owned = AssignmentService::owned_file(db, grace.account.id, &requested)
        .await
        .unwrap();
    assert_eq!(owned.id, first.id);
    assert_eq!(files.read(&requested).await.unwrap(), b"print('hello')");

    // other teachers cannot
    let alan = teacher(db, "Alan Turing").await;
    let result = AssignmentService::owned_file(db, alan.account.id, &requested).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[test(tokio::test)]
async fn test_submit_requires_enrollment_and_open_assignment() {
    let test_db = setup().await;
    let db = &test_db.db;
    let files = SubmissionFiles::new(test_db.dir.path());
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let outsider = student(db, "Kurt Godel", "9", "B").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let assignment = AssignmentService::create(
        db,
        grace.account.id,
        new_assignment(algebra.id, today()),
    )
    .await
    .unwrap();

    let result = AssignmentService::submit(
        db,
        &files,
        assignment.id,
        outsider.account.id,
        upload("hw.py"),
        None,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::NotFound("assignment"))));

    AssignmentService::update(
        db,
        grace.account.id,
        assignment.id,
        AssignmentChanges {
            status: Some(AssignmentStatus::Closed),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let result = AssignmentService::submit(
        db,
        &files,
        assignment.id,
        ada.account.id,
        upload("hw.py"),
        None,
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Conflict(_))));
}

#[test(tokio::test)]
async fn test_assignment_creation_rules() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let alan = teacher(db, "Alan Turing").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;

    let result = AssignmentService::create(db, alan.account.id, new_assignment(algebra.id, today())).await;
    assert!(matches!(result, Err(ServiceError::NotFound("class"))));

    let mut zero = new_assignment(algebra.id, today());
    zero.max_score = 0.0;
    let result = AssignmentService::create(db, grace.account.id, zero).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    let mut untitled = new_assignment(algebra.id, today());
    untitled.title = "   ".to_string();
    let result = AssignmentService::create(db, grace.account.id, untitled).await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test(tokio::test)]
async fn test_grading_same_triple_twice_keeps_one_row() {
    let test_db = setup().await;
    let db = &test_db.db;
    let files = SubmissionFiles::new(test_db.dir.path());
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let assignment = AssignmentService::create(
        db,
        grace.account.id,
        new_assignment(algebra.id, today() + Duration::days(1)),
    )
    .await
    .unwrap();
    let submission = AssignmentService::submit(
        db,
        &files,
        assignment.id,
        ada.account.id,
        upload("hw.py"),
        None,
    )
    .await
    .unwrap();

    for score in [85.0, 90.0] {
        GradeService::upsert(
            db,
            grace.account.id,
            algebra.id,
            GradeInput {
                student_id: ada.account.id,
                assignment_id: Some(assignment.id),
                score: Some(score),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    let rows = grades::Entity::find()
        .filter(grades::Column::StudentId.eq(ada.account.id))
        .all(db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, Some(90.0));
    assert_eq!(rows[0].status, GradeStatus::Graded);
    assert_eq!(rows[0].submission_id, Some(submission.id));

    let submission = assignment_submissions::Entity::find_by_id(submission.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(submission.status, SubmissionStatus::Graded);

    let with_grades = AssignmentService::submissions(db, grace.account.id, assignment.id)
        .await
        .unwrap();
    assert_eq!(with_grades.len(), 1);
    assert_eq!(with_grades[0].grade.as_ref().and_then(|g| g.score), Some(90.0));

    let commented = GradeService::comment(
        db,
        grace.account.id,
        algebra.id,
        ada.account.id,
        Some(assignment.id),
        "Well done".to_string(),
    )
    .await
    .unwrap();
    assert_eq!(commented.comment.as_deref(), Some("Well done"));

    // no class-level grade exists yet
    let result = GradeService::comment(
        db,
        grace.account.id,
        algebra.id,
        ada.account.id,
        None,
        "Overall".to_string(),
    )
    .await;
    assert!(matches!(result, Err(ServiceError::NotFound("grade"))));

    let student_grades = GradeService::student_grades(db, ada.account.id, Some(algebra.id))
        .await
        .unwrap();
    assert_eq!(student_grades.len(), 1);
    assert_eq!(student_grades[0].class_name, "Algebra 9A");
    assert_eq!(student_grades[0].assignment_title.as_deref(), Some("Quadratic equations"));
}

#[test(tokio::test)]
async fn test_grade_without_submission_stays_pending_until_scored() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id, alan.account.id])
        .await
        .unwrap();
    let assignment = AssignmentService::create(db, grace.account.id, new_assignment(algebra.id, today()))
        .await
        .unwrap();

    let grade = GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            assignment_id: Some(assignment.id),
            comment: Some("Missing work".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(grade.status, GradeStatus::Pending);
    assert_eq!(grade.submission_id, None);
    assert_eq!(grade.max_score, 100.0);

    let rows = GradeService::class_grades(db, grace.account.id, algebra.id, Some(assignment.id))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].student.student.account.full_name, "Ada Lovelace");
    assert!(rows[0].grade.is_some());
    assert!(rows[1].grade.is_none());
    assert!(rows[1].submission.is_none());

    let result = GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: alan.account.id,
            assignment_id: Some(assignment.id),
            score: Some(120.0),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test(tokio::test)]
async fn test_overdue_is_only_displayed() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let late = AssignmentService::create(
        db,
        grace.account.id,
        new_assignment(algebra.id, today() - Duration::days(1)),
    )
    .await
    .unwrap();
    assert_eq!(late.status, AssignmentStatus::Active);

    let listed = AssignmentService::teacher_assignments(db, grace.account.id, today())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].display_status, DisplayStatus::Overdue);
    assert_eq!(listed[0].assignment.status, AssignmentStatus::Active);
    assert_eq!(listed[0].total_students, 1);
    assert_eq!(listed[0].class_name, "Algebra 9A");

    let visible = AssignmentService::student_assignments(db, ada.account.id, Some("OVERDUE"), today())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    let visible = AssignmentService::student_assignments(db, ada.account.id, Some("closed"), today())
        .await
        .unwrap();
    assert!(visible.is_empty());
}

#[test(tokio::test)]
async fn test_delete_assignment_cascades() {
    let test_db = setup().await;
    let db = &test_db.db;
    let files = SubmissionFiles::new(test_db.dir.path());
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let assignment = AssignmentService::create(db, grace.account.id, new_assignment(algebra.id, today()))
        .await
        .unwrap();
    AssignmentService::submit(db, &files, assignment.id, ada.account.id, upload("hw.py"), None)
        .await
        .unwrap();
    GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            assignment_id: Some(assignment.id),
            score: Some(75.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let alan = teacher(db, "Alan Turing").await;
    let result = AssignmentService::delete(db, alan.account.id, assignment.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound("assignment"))));

    AssignmentService::delete(db, grace.account.id, assignment.id)
        .await
        .unwrap();

    assert_eq!(grades::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(assignment_submissions::Entity::find().count(db).await.unwrap(), 0);
}

#[test(tokio::test)]
async fn test_attendance_defaults_to_absent() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    let alan = student(db, "Alan Turing", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[alan.account.id, ada.account.id])
        .await
        .unwrap();
    let day = today();

    AttendanceService::mark(
        db,
        grace.account.id,
        algebra.id,
        day,
        vec![AttendanceEntry {
            student_id: alan.account.id,
            status: AttendanceStatus::Present,
            notes: None,
        }],
    )
    .await
    .unwrap();

    let rows = AttendanceService::for_date(db, grace.account.id, algebra.id, day)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].student_name, "Ada Lovelace");
    assert_eq!(rows[0].record.status, AttendanceStatus::Absent);
    assert_eq!(rows[1].record.status, AttendanceStatus::Present);

    // marking again replaces the earlier record
    AttendanceService::mark(
        db,
        grace.account.id,
        algebra.id,
        day,
        vec![AttendanceEntry {
            student_id: ada.account.id,
            status: AttendanceStatus::Late,
            notes: Some("bus".to_string()),
        }],
    )
    .await
    .unwrap();
    let history = AttendanceService::student_attendance(db, ada.account.id, Some(day), Some(day), None)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].record.status, AttendanceStatus::Late);
    assert_eq!(history[0].class_name, "Algebra 9A");

    let stats = ReportService::teacher_dashboard(db, grace.account.id, day)
        .await
        .unwrap();
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.total_classes, 1);
    assert_eq!(stats.average_attendance, 50.0);

    let activities = ReportService::activities(db, grace.account.id).await.unwrap();
    assert_eq!(activities.len(), 2);
    assert!(activities.iter().any(|a| a.title == "Marked Alan Turing as present in Algebra 9A"));
}

#[test(tokio::test)]
async fn test_schedules() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let teacher_days: Vec<_> = ReportService::teacher_schedule(db, grace.account.id)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.day)
        .collect();
    assert_eq!(teacher_days, vec!["Monday", "Wednesday"]);

    let student_schedule = ReportService::student_schedule(db, ada.account.id).await.unwrap();
    assert_eq!(student_schedule.len(), 2);
    assert_eq!(student_schedule[0].teacher_name.as_deref(), Some("Grace Hopper"));
    assert_eq!(
        student_schedule[0].time.map(|t| t.to_string()).as_deref(),
        Some("09:00-10:30")
    );
}

#[test(tokio::test)]
async fn test_unscored_grade_leaves_submission_pending() {
    let test_db = setup().await;
    let db = &test_db.db;
    let files = SubmissionFiles::new(test_db.dir.path());
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let assignment = AssignmentService::create(
        db,
        grace.account.id,
        new_assignment(algebra.id, today() + Duration::days(3)),
    )
    .await
    .unwrap();
    let submission = AssignmentService::submit(db, &files, assignment.id, ada.account.id, upload("hw.py"), None)
        .await
        .unwrap();

    let grade = GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            assignment_id: Some(assignment.id),
            comment: Some("will grade later".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(grade.status, GradeStatus::Pending);
    assert_eq!(grade.submission_id, Some(submission.id));

    let stored = assignment_submissions::Entity::find_by_id(submission.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubmissionStatus::Submitted);

    let detail = AssignmentService::detail(db, grace.account.id, assignment.id, today())
        .await
        .unwrap();
    assert_eq!(detail.summary.submissions.total, 1);
    assert_eq!(detail.summary.submissions.graded, 0);
    assert_eq!(detail.summary.submissions.pending, 1);

    // scoring it later completes the submission
    GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            assignment_id: Some(assignment.id),
            score: Some(70.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stored = assignment_submissions::Entity::find_by_id(submission.id)
        .one(db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, SubmissionStatus::Graded);

    let detail = AssignmentService::detail(db, grace.account.id, assignment.id, today())
        .await
        .unwrap();
    assert_eq!(detail.summary.submissions.graded, 1);
    assert_eq!(detail.summary.submissions.pending, 0);
}

#[test(tokio::test)]
async fn test_partial_grade_update_keeps_stored_fields() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let first = GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            score: Some(40.0),
            max_score: Some(50.0),
            weight: Some(2.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(first.max_score, 50.0);

    let second = GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            comment: Some("nice".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.max_score, 50.0);
    assert_eq!(second.score, Some(40.0));
    assert_eq!(second.weight, 2.0);
    assert_eq!(second.status, GradeStatus::Graded);
    assert_eq!(second.comment.as_deref(), Some("nice"));

    // scores are checked against the stored maximum
    let result = GradeService::upsert(
        db,
        grace.account.id,
        algebra.id,
        GradeInput {
            student_id: ada.account.id,
            score: Some(60.0),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test(tokio::test)]
async fn test_duplicate_submission_row_is_a_conflict() {
    let test_db = setup().await;
    let db = &test_db.db;
    let files = SubmissionFiles::new(test_db.dir.path());
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let ada = student(db, "Ada Lovelace", "9", "A").await;
    RosterService::enroll(db, algebra.id, &[ada.account.id]).await.unwrap();

    let assignment = AssignmentService::create(db, grace.account.id, new_assignment(algebra.id, today()))
        .await
        .unwrap();
    let first = AssignmentService::submit(db, &files, assignment.id, ada.account.id, upload("hw.py"), None)
        .await
        .unwrap();

    // a racing submit that passed the existence check still hits the unique index
    let err = assignment_submissions::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        assignment_id: Set(assignment.id),
        student_id: Set(ada.account.id),
        content: Set(None),
        file_path: Set(first.file_path.clone()),
        submission_date: Set(Utc::now()),
        status: Set(SubmissionStatus::Submitted),
        feedback: Set(None),
    }
    .insert(db)
    .await
    .unwrap_err();

    let err = ServiceError::unique_conflict(err, "You have already submitted this assignment");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(assignment_submissions::Entity::find().count(db).await.unwrap(), 1);
}

#[test(tokio::test)]
async fn test_dashboard_ignores_inactive_classes() {
    let test_db = setup().await;
    let db = &test_db.db;
    let grace = teacher(db, "Grace Hopper").await;
    let algebra = class(db, &grace, "Algebra 9A", "9", "A", 30).await;
    let geometry = class(db, &grace, "Geometry 9B", "9", "B", 30).await;

    for class_id in [algebra.id, geometry.id] {
        AssignmentService::create(db, grace.account.id, new_assignment(class_id, today()))
            .await
            .unwrap();
    }

    let stats = ReportService::teacher_dashboard(db, grace.account.id, today())
        .await
        .unwrap();
    assert_eq!(stats.active_assignments, 2);

    ClassService::update(
        db,
        geometry.id,
        ClassChanges {
            status: Some(ClassStatus::Inactive),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stats = ReportService::teacher_dashboard(db, grace.account.id, today())
        .await
        .unwrap();
    assert_eq!(stats.total_classes, 1);
    assert_eq!(stats.active_assignments, 1);
}
