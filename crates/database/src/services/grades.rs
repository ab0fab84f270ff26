use crate::{
    entities::{assignment_submissions, assignments, classes, grades},
    error::{ServiceError, ServiceResult},
    services::{
        assignments::AssignmentService,
        classes::ClassService,
        roster::{EnrolledStudent, RosterService},
        users::UserService,
    },
};
use chrono::Utc;
use log::info;
use models::{
    Role,
    status::{GradeStatus, SubmissionStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Select, TransactionTrait,
};
use serde_json::Value as Json;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const DEFAULT_MAX_SCORE: f64 = 100.0;
const DEFAULT_GRADE_TYPE: &str = "assignment";
const DEFAULT_WEIGHT: f64 = 1.0;

/// One grade to record for a student
#[derive(Debug, Clone, Default)]
pub struct GradeInput {
    pub student_id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub grade_type: Option<String>,
    pub weight: Option<f64>,
    pub comment: Option<String>,
    pub rubric_data: Option<Json>,
    pub status: Option<GradeStatus>,
}

#[derive(Debug, Clone)]
pub struct BulkGrade {
    pub class_id: Uuid,
    pub grade: GradeInput,
}

/// A student of a class with the grade and submission for the selected assignment
#[derive(Debug, Clone)]
pub struct ClassGradeRow {
    pub student: EnrolledStudent,
    pub grade: Option<grades::Model>,
    pub submission: Option<assignment_submissions::Model>,
}

#[derive(Debug, Clone)]
pub struct StudentGrade {
    pub grade: grades::Model,
    pub class_name: String,
    pub subject: String,
    pub assignment_title: Option<String>,
}

pub struct GradeService;

impl GradeService {
    /// Records a grade, replacing the one already held for the same class, assignment and student
    pub async fn upsert(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
        input: GradeInput,
    ) -> ServiceResult<grades::Model> {
        let txn = db.begin().await?;

        ClassService::owned(&txn, class_id, teacher_id).await?;
        let grade = Self::upsert_in(&txn, class_id, input).await?;

        txn.commit().await?;
        Ok(grade)
    }

    /// Grades across several classes; one class not owned by the teacher rejects all
    pub async fn bulk(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        entries: Vec<BulkGrade>,
    ) -> ServiceResult<Vec<grades::Model>> {
        if entries.is_empty() {
            return Err(ServiceError::validation("grades must not be empty"));
        }

        let txn = db.begin().await?;

        let class_ids: HashSet<Uuid> = entries.iter().map(|e| e.class_id).collect();
        for &class_id in &class_ids {
            ClassService::owned(&txn, class_id, teacher_id).await?;
        }

        let mut saved = Vec::with_capacity(entries.len());
        for entry in entries {
            saved.push(Self::upsert_in(&txn, entry.class_id, entry.grade).await?);
        }

        txn.commit().await?;
        info!("Saved {} grades in {} classes", saved.len(), class_ids.len());

        Ok(saved)
    }

    pub async fn comment(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
        student_id: Uuid,
        assignment_id: Option<Uuid>,
        comment: String,
    ) -> ServiceResult<grades::Model> {
        ClassService::owned(db, class_id, teacher_id).await?;

        let grade = triple(class_id, student_id, assignment_id)
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("grade"))?;

        let mut active: grades::ActiveModel = grade.into();
        active.comment = Set(Some(comment));
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    pub async fn update_rubric(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        grade_id: Uuid,
        rubric_data: Json,
    ) -> ServiceResult<grades::Model> {
        let grade = grades::Entity::find_by_id(grade_id)
            .inner_join(classes::Entity)
            .filter(classes::Column::TeacherId.eq(teacher_id))
            .one(db)
            .await?
            .ok_or(ServiceError::NotFound("grade"))?;

        let mut active: grades::ActiveModel = grade.into();
        active.rubric_data = Set(Some(rubric_data));
        active.updated_at = Set(Utc::now());

        Ok(active.update(db).await?)
    }

    /// One row per actively enrolled student, ordered by name
    pub async fn class_grades(
        db: &DatabaseConnection,
        teacher_id: Uuid,
        class_id: Uuid,
        assignment_id: Option<Uuid>,
    ) -> ServiceResult<Vec<ClassGradeRow>> {
        ClassService::owned(db, class_id, teacher_id).await?;
        if let Some(assignment_id) = assignment_id {
            assignment_in_class(db, assignment_id, class_id).await?;
        }

        let students = RosterService::class_students(db, class_id).await?;

        let mut query = grades::Entity::find().filter(grades::Column::ClassId.eq(class_id));
        query = match assignment_id {
            Some(id) => query.filter(grades::Column::AssignmentId.eq(id)),
            None => query.filter(grades::Column::AssignmentId.is_null()),
        };
        let mut grades: HashMap<Uuid, grades::Model> = query
            .all(db)
            .await?
            .into_iter()
            .map(|grade| (grade.student_id, grade))
            .collect();

        let mut submissions: HashMap<Uuid, assignment_submissions::Model> = match assignment_id {
            Some(id) => assignment_submissions::Entity::find()
                .filter(assignment_submissions::Column::AssignmentId.eq(id))
                .all(db)
                .await?
                .into_iter()
                .map(|submission| (submission.student_id, submission))
                .collect(),
            None => HashMap::new(),
        };

        Ok(students
            .into_iter()
            .map(|student| {
                let id = student.student.account.id;
                ClassGradeRow {
                    grade: grades.remove(&id),
                    submission: submissions.remove(&id),
                    student,
                }
            })
            .collect())
    }

    /// A student's grades, newest first
    pub async fn student_grades(
        db: &DatabaseConnection,
        student_id: Uuid,
        class_id: Option<Uuid>,
    ) -> ServiceResult<Vec<StudentGrade>> {
        let mut query = grades::Entity::find()
            .filter(grades::Column::StudentId.eq(student_id))
            .order_by_desc(grades::Column::CreatedAt);
        if let Some(class_id) = class_id {
            query = query.filter(grades::Column::ClassId.eq(class_id));
        }

        let rows = query.find_also_related(classes::Entity).all(db).await?;

        let assignment_ids: Vec<Uuid> = rows.iter().filter_map(|(g, _)| g.assignment_id).collect();
        let titles: HashMap<Uuid, String> = if assignment_ids.is_empty() {
            HashMap::new()
        } else {
            assignments::Entity::find()
                .filter(assignments::Column::Id.is_in(assignment_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|a| (a.id, a.title))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|(grade, class)| {
                let (class_name, subject) = class
                    .map(|c| (c.name, c.subject))
                    .unwrap_or_default();
                StudentGrade {
                    assignment_title: grade.assignment_id.and_then(|id| titles.get(&id).cloned()),
                    class_name,
                    subject,
                    grade,
                }
            })
            .collect())
    }

    pub(crate) async fn upsert_in<C: ConnectionTrait>(
        txn: &C,
        class_id: Uuid,
        input: GradeInput,
    ) -> ServiceResult<grades::Model> {
        UserService::require_role(txn, input.student_id, Role::Student).await?;

        let assignment = match input.assignment_id {
            Some(id) => Some(assignment_in_class(txn, id, class_id).await?),
            None => None,
        };
        let existing = triple(class_id, input.student_id, input.assignment_id)
            .one(txn)
            .await?;

        // fields the caller left out keep their stored values
        let max_score = input
            .max_score
            .or(existing.as_ref().map(|g| g.max_score))
            .or(assignment.as_ref().map(|a| a.max_score))
            .unwrap_or(DEFAULT_MAX_SCORE);
        let score = input.score.or(existing.as_ref().and_then(|g| g.score));
        validate_score(score, max_score)?;

        let submission = match &assignment {
            Some(assignment) => {
                AssignmentService::find_submission(txn, assignment.id, input.student_id).await?
            }
            None => None,
        };
        let now = Utc::now();

        let grade = match existing {
            Some(grade) => {
                let status = grade_status(score, input.status.or(Some(grade.status)));
                let mut active: grades::ActiveModel = grade.into();
                active.score = Set(score);
                active.max_score = Set(max_score);
                if let Some(grade_type) = input.grade_type {
                    active.grade_type = Set(grade_type);
                }
                if let Some(weight) = input.weight {
                    active.weight = Set(weight);
                }
                if let Some(comment) = input.comment {
                    active.comment = Set(Some(comment));
                }
                if let Some(rubric_data) = input.rubric_data {
                    active.rubric_data = Set(Some(rubric_data));
                }
                if let Some(submission) = &submission {
                    active.submission_id = Set(Some(submission.id));
                }
                active.status = Set(status);
                active.updated_at = Set(now);
                active.update(txn).await?
            }
            None => {
                grades::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    student_id: Set(input.student_id),
                    class_id: Set(class_id),
                    assignment_id: Set(input.assignment_id),
                    submission_id: Set(submission.as_ref().map(|s| s.id)),
                    score: Set(score),
                    max_score: Set(max_score),
                    grade_type: Set(input
                        .grade_type
                        .unwrap_or_else(|| DEFAULT_GRADE_TYPE.to_string())),
                    weight: Set(input.weight.unwrap_or(DEFAULT_WEIGHT)),
                    rubric_data: Set(input.rubric_data),
                    comment: Set(input.comment),
                    status: Set(grade_status(score, input.status)),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await?
            }
        };

        if let Some(submission) = submission.filter(|_| grade.status == GradeStatus::Graded) {
            let mut active: assignment_submissions::ActiveModel = submission.into();
            active.status = Set(SubmissionStatus::Graded);
            active.update(txn).await?;
        }

        Ok(grade)
    }
}

/// The grade for one (class, assignment, student); `None` selects the class-level grade
fn triple(class_id: Uuid, student_id: Uuid, assignment_id: Option<Uuid>) -> Select<grades::Entity> {
    let query = grades::Entity::find()
        .filter(grades::Column::ClassId.eq(class_id))
        .filter(grades::Column::StudentId.eq(student_id));

    match assignment_id {
        Some(id) => query.filter(grades::Column::AssignmentId.eq(id)),
        None => query.filter(grades::Column::AssignmentId.is_null()),
    }
}

async fn assignment_in_class<C: ConnectionTrait>(
    db: &C,
    assignment_id: Uuid,
    class_id: Uuid,
) -> ServiceResult<assignments::Model> {
    assignments::Entity::find_by_id(assignment_id)
        .filter(assignments::Column::ClassId.eq(class_id))
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound("assignment"))
}

/// `graded` whenever a score is present
pub fn grade_status(score: Option<f64>, requested: Option<GradeStatus>) -> GradeStatus {
    match score {
        Some(_) => GradeStatus::Graded,
        None => requested.unwrap_or_default(),
    }
}

fn validate_score(score: Option<f64>, max_score: f64) -> ServiceResult<()> {
    if !(max_score.is_finite() && max_score > 0.0) {
        return Err(ServiceError::validation("max_score must be greater than 0"));
    }
    match score {
        Some(score) if !score.is_finite() || score < 0.0 || score > max_score => Err(
            ServiceError::validation(format!("score must be between 0 and {max_score}")),
        ),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_score_forces_graded() {
        assert_eq!(grade_status(Some(0.0), Some(GradeStatus::Pending)), GradeStatus::Graded);
        assert_eq!(grade_status(None, Some(GradeStatus::Graded)), GradeStatus::Graded);
        assert_eq!(grade_status(None, None), GradeStatus::Pending);
    }

    #[test]
    fn test_score_bounds() {
        assert!(validate_score(Some(100.0), 100.0).is_ok());
        assert!(validate_score(None, 100.0).is_ok());
        assert!(matches!(
            validate_score(Some(101.0), 100.0),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            validate_score(Some(-1.0), 100.0),
            Err(ServiceError::Validation(_))
        ));
        assert!(validate_score(Some(5.0), 0.0).is_err());
    }
}
