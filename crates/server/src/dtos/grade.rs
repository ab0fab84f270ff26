use chrono::{DateTime, Utc};
use database::{
    entities::grades,
    services::grades::{BulkGrade, ClassGradeRow, GradeInput, StudentGrade},
};
use models::status::GradeStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeCreate {
    pub student_id: Uuid,
    /// Omitted for class-level grades
    pub assignment_id: Option<Uuid>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub grade_type: Option<String>,
    pub weight: Option<f64>,
    pub comment: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub rubric_data: Option<Json>,
    pub status: Option<GradeStatus>,
}

impl From<GradeCreate> for GradeInput {
    fn from(create: GradeCreate) -> Self {
        Self {
            student_id: create.student_id,
            assignment_id: create.assignment_id,
            score: create.score,
            max_score: create.max_score,
            grade_type: create.grade_type,
            weight: create.weight,
            comment: create.comment,
            rubric_data: create.rubric_data,
            status: create.status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkGradeEntry {
    pub class_id: Uuid,
    #[serde(flatten)]
    pub grade: GradeCreate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkGradeRequest {
    pub grades: Vec<BulkGradeEntry>,
}

impl From<BulkGradeRequest> for Vec<BulkGrade> {
    fn from(request: BulkGradeRequest) -> Self {
        request
            .grades
            .into_iter()
            .map(|entry| BulkGrade {
                class_id: entry.class_id,
                grade: entry.grade.into(),
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeComment {
    pub student_id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RubricUpdate {
    #[schema(value_type = Object)]
    pub rubric_data: Json,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GradeResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub submission_id: Option<Uuid>,
    pub score: Option<f64>,
    pub max_score: f64,
    pub grade_type: String,
    pub weight: f64,
    #[schema(value_type = Option<Object>)]
    pub rubric_data: Option<Json>,
    pub comment: Option<String>,
    pub status: GradeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<grades::Model> for GradeResponse {
    fn from(grade: grades::Model) -> Self {
        Self {
            id: grade.id,
            student_id: grade.student_id,
            class_id: grade.class_id,
            assignment_id: grade.assignment_id,
            submission_id: grade.submission_id,
            score: grade.score,
            max_score: grade.max_score,
            grade_type: grade.grade_type,
            weight: grade.weight,
            rubric_data: grade.rubric_data,
            comment: grade.comment,
            status: grade.status,
            created_at: grade.created_at,
            updated_at: grade.updated_at,
        }
    }
}

/// A student of the class with their grade for the selected assignment, if any
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassGradeResponse {
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub grade: Option<GradeResponse>,
    pub submission_id: Option<Uuid>,
    pub submission_status: String,
    pub file_path: Option<String>,
}

impl From<ClassGradeRow> for ClassGradeResponse {
    fn from(row: ClassGradeRow) -> Self {
        let account = row.student.student.account;
        let submission = row.submission;

        Self {
            student_id: account.id,
            student_name: account.full_name,
            student_email: account.email,
            grade: row.grade.map(Into::into),
            submission_id: submission.as_ref().map(|s| s.id),
            submission_status: submission
                .as_ref()
                .map(|s| s.status.to_string())
                .unwrap_or_else(|| "not_submitted".to_string()),
            file_path: submission.and_then(|s| s.file_path),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentGradeResponse {
    #[serde(flatten)]
    pub grade: GradeResponse,
    pub class_name: String,
    pub subject: String,
    pub assignment_title: Option<String>,
}

impl From<StudentGrade> for StudentGradeResponse {
    fn from(row: StudentGrade) -> Self {
        Self {
            grade: row.grade.into(),
            class_name: row.class_name,
            subject: row.subject,
            assignment_title: row.assignment_title,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GradeQuery {
    /// Without it the class-level grades are listed
    pub assignment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentGradeQuery {
    pub class_id: Option<Uuid>,
}
