use crate::{
    entities::{assignment_submissions, assignments, classes, grades, users},
    error::{ServiceError, ServiceResult},
    services::{classes::ClassService, files::SubmissionFiles, roster::RosterService},
};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use models::status::{AssignmentStatus, ClassStatus, DisplayStatus, SubmissionStatus};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub class_id: Uuid,
    pub due_date: NaiveDate,
    pub max_score: f64,
    pub status: AssignmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub max_score: Option<f64>,
    pub status: Option<AssignmentStatus>,
}

/// An uploaded file
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionStats {
    pub total: u64,
    pub graded: u64,
    pub pending: u64,
}

/// An assignment as listed for its teacher
#[derive(Debug, Clone)]
pub struct AssignmentSummary {
    pub assignment: assignments::Model,
    pub class_name: String,
    pub display_status: DisplayStatus,
    pub total_students: u64,
    pub submissions: SubmissionStats,
}

#[derive(Debug, Clone)]
pub struct SubmissionWithGrade {
    pub submission: assignment_submissions::Model,
    pub student: Option<users::Model>,
    pub grade: Option<grades::Model>,
}

#[derive(Debug, Clone)]
pub struct AssignmentDetail {
    pub summary: AssignmentSummary,
    pub submissions: Vec<SubmissionWithGrade>,
}

/// An assignment as seen by one enrolled student
#[derive(Debug, Clone)]
pub struct StudentAssignment {
    pub assignment: assignments::Model,
    pub class: classes::Model,
    pub display_status: DisplayStatus,
    pub submission: Option<assignment_submissions::Model>,
    pub grade: Option<grades::Model>,
}

pub struct AssignmentService;

impl AssignmentService {
    pub async fn create(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        new_assignment: NewAssignment,
    ) -> ServiceResult<assignments::Model> {
        validate_title(&new_assignment.title)?;
        validate_max_score(new_assignment.max_score)?;

        let class = ClassService::owned(db, new_assignment.class_id, teacher_id).await?;
        if class.status != ClassStatus::Active {
            return Err(ServiceError::conflict(format!(
                "Class {} is not active",
                class.name
            )));
        }

        let now = Utc::now();
        let assignment = assignments::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_assignment.title.trim().to_string()),
            description: Set(new_assignment.description),
            class_id: Set(class.id),
            teacher_id: Set(teacher_id),
            due_date: Set(new_assignment.due_date),
            max_score: Set(new_assignment.max_score),
            status: Set(new_assignment.status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!("Created assignment {} in class {}", assignment.title, class.name);
        Ok(assignment)
    }

    pub async fn update(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        assignment_id: Uuid,
        changes: AssignmentChanges,
    ) -> ServiceResult<assignments::Model> {
        let assignment = Self::owned(db, assignment_id, teacher_id).await?;
        let mut active: assignments::ActiveModel = assignment.into();

        if let Some(title) = changes.title {
            validate_title(&title)?;
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(due_date) = changes.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(max_score) = changes.max_score {
            validate_max_score(max_score)?;
            active.max_score = Set(max_score);
        }
        if let Some(status) = changes.status {
            active.status = Set(status);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// Deletes grades, then submissions, then the assignment, all or nothing
    pub async fn delete(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        assignment_id: Uuid,
    ) -> ServiceResult<assignments::Model> {
        let txn = db.begin().await?;

        let assignment = Self::owned(&txn, assignment_id, teacher_id).await?;

        let grades = grades::Entity::delete_many()
            .filter(grades::Column::AssignmentId.eq(assignment_id))
            .exec(&txn)
            .await?;
        let submissions = assignment_submissions::Entity::delete_many()
            .filter(assignment_submissions::Column::AssignmentId.eq(assignment_id))
            .exec(&txn)
            .await?;
        assignments::Entity::delete_by_id(assignment_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(
            "Deleted assignment {} with {} grades and {} submissions",
            assignment.title, grades.rows_affected, submissions.rows_affected
        );

        Ok(assignment)
    }

    /// An assignment created by `teacher_id`; others look missing
    pub async fn owned<C: sea_orm::ConnectionTrait>(
        db: &C,
        assignment_id: Uuid,
        teacher_id: Uuid,
    ) -> ServiceResult<assignments::Model> {
        assignments::Entity::find_by_id(assignment_id)
            .filter(assignments::Column::TeacherId.eq(teacher_id))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("assignment"))
    }

    pub async fn teacher_assignments(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        today: NaiveDate,
    ) -> ServiceResult<Vec<AssignmentSummary>> {
        let assignments = assignments::Entity::find()
            .filter(assignments::Column::TeacherId.eq(teacher_id))
            .order_by_desc(assignments::Column::DueDate)
            .all(db)
            .await?;

        Self::summarize(db, assignments, today).await
    }

    pub async fn class_assignments(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
        today: NaiveDate,
    ) -> ServiceResult<Vec<AssignmentSummary>> {
        ClassService::owned(db, class_id, teacher_id).await?;

        let assignments = assignments::Entity::find()
            .filter(assignments::Column::ClassId.eq(class_id))
            .order_by_desc(assignments::Column::DueDate)
            .all(db)
            .await?;

        Self::summarize(db, assignments, today).await
    }

    pub async fn detail(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        assignment_id: Uuid,
        today: NaiveDate,
    ) -> ServiceResult<AssignmentDetail> {
        let assignment = Self::owned(db, assignment_id, teacher_id).await?;
        let submissions = Self::submissions(db, teacher_id, assignment_id).await?;
        let summary = Self::summarize(db, vec![assignment], today)
            .await?
            .remove(0);

        Ok(AssignmentDetail {
            summary,
            submissions,
        })
    }

    /// Submissions of an assignment with the grade matched to each
    pub async fn submissions(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        assignment_id: Uuid,
    ) -> ServiceResult<Vec<SubmissionWithGrade>> {
        Self::owned(db, assignment_id, teacher_id).await?;

        let submissions = assignment_submissions::Entity::find()
            .filter(assignment_submissions::Column::AssignmentId.eq(assignment_id))
            .order_by_desc(assignment_submissions::Column::SubmissionDate)
            .find_also_related(users::Entity)
            .all(db)
            .await?;
        let grades = grades::Entity::find()
            .filter(grades::Column::AssignmentId.eq(assignment_id))
            .all(db)
            .await?;

        Ok(submissions
            .into_iter()
            .map(|(submission, student)| SubmissionWithGrade {
                grade: grade_for_submission(&submission, &grades).cloned(),
                submission,
                student,
            })
            .collect())
    }

    /// Assignments of every class the student is actively enrolled in.
    ///
    /// `status_filter` is a case-insensitive substring of the stored or displayed status.
    pub async fn student_assignments(
        db: &DatabaseConnection,
        student_id: Uuid,
        status_filter: Option<&str>,
        today: NaiveDate,
    ) -> ServiceResult<Vec<StudentAssignment>> {
        let classes: HashMap<Uuid, classes::Model> = RosterService::student_classes(db, student_id)
            .await?
            .into_iter()
            .map(|class| (class.id, class))
            .collect();
        if classes.is_empty() {
            return Ok(Vec::new());
        }

        let assignments = assignments::Entity::find()
            .filter(assignments::Column::ClassId.is_in(classes.keys().copied()))
            .order_by_asc(assignments::Column::DueDate)
            .all(db)
            .await?;
        let assignment_ids: Vec<Uuid> = assignments.iter().map(|a| a.id).collect();

        let mut submissions: HashMap<Uuid, assignment_submissions::Model> =
            assignment_submissions::Entity::find()
                .filter(assignment_submissions::Column::StudentId.eq(student_id))
                .filter(assignment_submissions::Column::AssignmentId.is_in(assignment_ids.clone()))
                .all(db)
                .await?
                .into_iter()
                .map(|submission| (submission.assignment_id, submission))
                .collect();
        let grades = grades::Entity::find()
            .filter(grades::Column::StudentId.eq(student_id))
            .filter(grades::Column::AssignmentId.is_in(assignment_ids))
            .all(db)
            .await?;

        let filter = status_filter
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty());

        Ok(assignments
            .into_iter()
            .filter_map(|assignment| {
                let display_status = assignment.status.display(assignment.due_date, today);
                if let Some(filter) = &filter {
                    let stored = assignment.status.to_string();
                    let shown = display_label(display_status).to_lowercase();
                    if !stored.contains(filter.as_str()) && !shown.contains(filter.as_str()) {
                        return None;
                    }
                }

                let class = classes.get(&assignment.class_id)?.clone();
                let submission = submissions.remove(&assignment.id);
                let grade = match &submission {
                    Some(submission) => grade_for_submission(submission, &grades).cloned(),
                    None => grades
                        .iter()
                        .find(|g| g.assignment_id == Some(assignment.id))
                        .cloned(),
                };

                Some(StudentAssignment {
                    assignment,
                    class,
                    display_status,
                    submission,
                    grade,
                })
            })
            .collect())
    }

    /// Records a student's single submission for an assignment
    pub async fn submit(
        db: &DatabaseConnection,
        files: &SubmissionFiles,
        assignment_id: Uuid,
        student_id: Uuid,
        upload: Upload,
        notes: Option<String>,
    ) -> ServiceResult<assignment_submissions::Model> {
        let assignment = assignments::Entity::find_by_id(assignment_id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("assignment"))?;

        // Only visible through an active enrollment
        if RosterService::active_enrollment(db, assignment.class_id, student_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound("assignment"));
        }
        if assignment.status != AssignmentStatus::Active {
            return Err(ServiceError::conflict(
                "This assignment is no longer accepting submissions",
            ));
        }
        if Self::find_submission(db, assignment_id, student_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict("You have already submitted this assignment"));
        }

        let file_path = files
            .store(student_id, assignment_id, &upload.filename, &upload.bytes)
            .await?;

        let inserted = assignment_submissions::ActiveModel {
            id: Set(Uuid::new_v4()),
            assignment_id: Set(assignment_id),
            student_id: Set(student_id),
            content: Set(notes.filter(|n| !n.trim().is_empty())),
            file_path: Set(Some(file_path.clone())),
            submission_date: Set(Utc::now()),
            status: Set(SubmissionStatus::Submitted),
            feedback: Set(None),
        }
        .insert(db)
        .await;

        let submission = match inserted {
            Ok(submission) => submission,
            Err(err) => {
                // a concurrent submit may have stored its file under the same name
                let kept = Self::find_submission(db, assignment_id, student_id)
                    .await?
                    .and_then(|winner| winner.file_path);
                if kept.as_deref() != Some(file_path.as_str()) {
                    if let Err(io) = files.remove(&file_path).await {
                        warn!("Could not remove {file_path}: {io}");
                    }
                }
                return Err(ServiceError::unique_conflict(
                    err,
                    "You have already submitted this assignment",
                ));
            }
        };

        info!("Student {student_id} submitted assignment {}", assignment.title);
        Ok(submission)
    }

    pub async fn find_submission<C: sea_orm::ConnectionTrait>(
        db: &C,
        assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<assignment_submissions::Model>, sea_orm::DbErr> {
        assignment_submissions::Entity::find()
            .filter(assignment_submissions::Column::AssignmentId.eq(assignment_id))
            .filter(assignment_submissions::Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    /// Returns the stored relative path when the teacher owns a submission with exactly that path
    pub async fn owned_file(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        relative_path: &str,
    ) -> ServiceResult<assignment_submissions::Model> {
        assignment_submissions::Entity::find()
            .inner_join(assignments::Entity)
            .filter(assignments::Column::TeacherId.eq(teacher_id))
            .filter(assignment_submissions::Column::FilePath.eq(relative_path))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("file"))
    }

    async fn summarize(
        db: &DatabaseConnection,
        assignments: Vec<assignments::Model>,
        today: NaiveDate,
    ) -> ServiceResult<Vec<AssignmentSummary>> {
        let class_ids: Vec<Uuid> = assignments.iter().map(|a| a.class_id).collect();
        let assignment_ids: Vec<Uuid> = assignments.iter().map(|a| a.id).collect();

        let class_names: HashMap<Uuid, String> = classes::Entity::find()
            .filter(classes::Column::Id.is_in(class_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|class| (class.id, class.name))
            .collect();
        let enrolled = ClassService::active_counts(db, class_ids).await?;

        let mut stats: HashMap<Uuid, SubmissionStats> = HashMap::new();
        if !assignment_ids.is_empty() {
            let submissions = assignment_submissions::Entity::find()
                .filter(assignment_submissions::Column::AssignmentId.is_in(assignment_ids.clone()))
                .all(db)
                .await?;
            let grades = grades::Entity::find()
                .filter(grades::Column::AssignmentId.is_in(assignment_ids))
                .all(db)
                .await?;

            for submission in &submissions {
                let graded = submission.status == SubmissionStatus::Graded
                    || grade_for_submission(submission, &grades).is_some_and(|g| g.score.is_some());
                let entry = stats.entry(submission.assignment_id).or_default();
                entry.total += 1;
                if graded {
                    entry.graded += 1;
                } else {
                    entry.pending += 1;
                }
            }
        }

        Ok(assignments
            .into_iter()
            .map(|assignment| AssignmentSummary {
                class_name: class_names
                    .get(&assignment.class_id)
                    .cloned()
                    .unwrap_or_default(),
                display_status: assignment.status.display(assignment.due_date, today),
                total_students: enrolled.get(&assignment.class_id).copied().unwrap_or(0),
                submissions: stats.get(&assignment.id).copied().unwrap_or_default(),
                assignment,
            })
            .collect())
    }
}

/// The grade belonging to a submission.
///
/// Grades carrying a `submission_id` match by it; grades without one fall back to the
/// same student and assignment.
pub fn grade_for_submission<'a>(
    submission: &assignment_submissions::Model,
    grades: &'a [grades::Model],
) -> Option<&'a grades::Model> {
    grades
        .iter()
        .find(|grade| grade.submission_id == Some(submission.id))
        .or_else(|| {
            grades.iter().find(|grade| {
                grade.submission_id.is_none()
                    && grade.student_id == submission.student_id
                    && grade.assignment_id == Some(submission.assignment_id)
            })
        })
}

/// Parses a due date given as `YYYY-MM-DD`, RFC 3339, `MM/DD/YYYY` or `DD-MM-YYYY`
pub fn parse_due_date(value: &str) -> ServiceResult<NaiveDate> {
    let value = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }

    ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(value, fmt).ok().or_else(|| {
                chrono::NaiveDateTime::parse_from_str(value, fmt)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
        .ok_or_else(|| ServiceError::validation(format!("invalid due_date: {value:?}")))
}

fn display_label(status: DisplayStatus) -> &'static str {
    match status {
        DisplayStatus::Active => "active",
        DisplayStatus::Closed => "closed",
        DisplayStatus::Overdue => "overdue",
    }
}

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::validation("title must not be empty"));
    }
    Ok(())
}

fn validate_max_score(max_score: f64) -> ServiceResult<()> {
    if !(max_score.is_finite() && max_score > 0.0) {
        return Err(ServiceError::validation("max_score must be greater than 0"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use models::status::GradeStatus;

    fn submission(student_id: Uuid, assignment_id: Uuid) -> assignment_submissions::Model {
        assignment_submissions::Model {
            id: Uuid::new_v4(),
            assignment_id,
            student_id,
            content: None,
            file_path: None,
            submission_date: Utc::now(),
            status: SubmissionStatus::Submitted,
            feedback: None,
        }
    }

    fn grade(
        student_id: Uuid,
        assignment_id: Uuid,
        submission_id: Option<Uuid>,
        score: f64,
    ) -> grades::Model {
        grades::Model {
            id: Uuid::new_v4(),
            student_id,
            class_id: Uuid::nil(),
            assignment_id: Some(assignment_id),
            submission_id,
            score: Some(score),
            max_score: 100.0,
            grade_type: "assignment".to_string(),
            weight: 1.0,
            rubric_data: None,
            comment: None,
            status: GradeStatus::Graded,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_grade_matches_by_submission_id_first() {
        let student = Uuid::new_v4();
        let assignment = Uuid::new_v4();
        let sub = submission(student, assignment);

        let legacy = grade(student, assignment, None, 50.0);
        let linked = grade(student, assignment, Some(sub.id), 90.0);
        let grades = vec![legacy, linked];

        let matched = grade_for_submission(&sub, &grades).unwrap();
        assert_eq!(matched.score, Some(90.0));
    }

    #[test]
    fn test_grade_falls_back_to_student_for_legacy_rows() {
        let student = Uuid::new_v4();
        let assignment = Uuid::new_v4();
        let sub = submission(student, assignment);

        let other_student = grade(Uuid::new_v4(), assignment, None, 10.0);
        let legacy = grade(student, assignment, None, 70.0);
        let grades = vec![other_student, legacy];

        assert_eq!(grade_for_submission(&sub, &grades).unwrap().score, Some(70.0));
    }

    #[test]
    fn test_grade_linked_to_other_submission_is_ignored() {
        let student = Uuid::new_v4();
        let assignment = Uuid::new_v4();
        let sub = submission(student, assignment);

        let grades = vec![grade(student, assignment, Some(Uuid::new_v4()), 80.0)];
        assert!(grade_for_submission(&sub, &grades).is_none());
    }

    #[test]
    fn test_parse_due_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        assert_eq!(parse_due_date("2025-03-14").unwrap(), expected);
        assert_eq!(parse_due_date("2025-03-14T23:59:00Z").unwrap(), expected);
        assert_eq!(parse_due_date("03/14/2025").unwrap(), expected);
        assert_eq!(parse_due_date("14-03-2025").unwrap(), expected);
        assert!(matches!(
            parse_due_date("next tuesday"),
            Err(ServiceError::Validation(_))
        ));
    }
}
