use crate::error::ApiError;
use chrono::{DateTime, NaiveDate, Utc};
use database::{
    entities::{assignment_submissions, grades},
    services::assignments::{
        AssignmentChanges, AssignmentDetail, AssignmentSummary, StudentAssignment,
        SubmissionStats, SubmissionWithGrade, parse_due_date,
    },
};
use models::status::{AssignmentStatus, DisplayStatus, GradeStatus, SubmissionStatus};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignmentCreate {
    pub title: String,
    pub description: Option<String>,
    pub class_id: Uuid,
    /// `YYYY-MM-DD` or RFC 3339
    pub due_date: String,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    /// `active` or `closed`, case-insensitive
    pub status: Option<String>,
}

fn default_max_score() -> f64 {
    100.0
}

/// Parses a status field, reporting the offending value
pub(crate) fn parse_status(value: Option<&str>) -> Result<Option<AssignmentStatus>, ApiError> {
    value
        .map(|status| {
            status
                .parse::<AssignmentStatus>()
                .map_err(|err| ApiError::Validation(err.to_string()))
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AssignmentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub max_score: Option<f64>,
    pub status: Option<String>,
}

impl TryFrom<AssignmentUpdate> for AssignmentChanges {
    type Error = ApiError;

    fn try_from(update: AssignmentUpdate) -> Result<Self, Self::Error> {
        Ok(Self {
            title: update.title,
            description: update.description,
            due_date: update.due_date.as_deref().map(parse_due_date).transpose()?,
            max_score: update.max_score,
            status: parse_status(update.status.as_deref())?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionStatsResponse {
    pub total: u64,
    pub graded: u64,
    pub pending: u64,
}

impl From<SubmissionStats> for SubmissionStatsResponse {
    fn from(stats: SubmissionStats) -> Self {
        Self {
            total: stats.total,
            graded: stats.graded,
            pending: stats.pending,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub class_id: Uuid,
    pub class_name: String,
    pub teacher_id: Uuid,
    pub due_date: NaiveDate,
    pub max_score: f64,
    /// `Overdue` when active and past due
    pub status: DisplayStatus,
    pub total_students: u64,
    pub submission_stats: SubmissionStatsResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AssignmentSummary> for AssignmentResponse {
    fn from(summary: AssignmentSummary) -> Self {
        let assignment = summary.assignment;
        Self {
            id: assignment.id,
            title: assignment.title,
            description: assignment.description,
            class_id: assignment.class_id,
            class_name: summary.class_name,
            teacher_id: assignment.teacher_id,
            due_date: assignment.due_date,
            max_score: assignment.max_score,
            status: summary.display_status,
            total_students: summary.total_students,
            submission_stats: summary.submissions.into(),
            created_at: assignment.created_at,
            updated_at: assignment.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
    pub grade_id: Option<Uuid>,
    pub score: Option<f64>,
    pub grade_comment: Option<String>,
}

impl From<SubmissionWithGrade> for SubmissionResponse {
    fn from(row: SubmissionWithGrade) -> Self {
        let submission = row.submission;
        let (student_name, student_email) = row
            .student
            .map(|s| (Some(s.full_name), Some(s.email)))
            .unwrap_or_default();

        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            student_name,
            student_email,
            content: submission.content,
            file_path: submission.file_path,
            submission_date: submission.submission_date,
            status: submission.status,
            feedback: submission.feedback,
            grade_id: row.grade.as_ref().map(|g| g.id),
            score: row.grade.as_ref().and_then(|g| g.score),
            grade_comment: row.grade.and_then(|g| g.comment),
        }
    }
}

impl From<assignment_submissions::Model> for SubmissionResponse {
    fn from(submission: assignment_submissions::Model) -> Self {
        SubmissionWithGrade {
            submission,
            student: None,
            grade: None,
        }
        .into()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignmentDetailResponse {
    #[serde(flatten)]
    pub assignment: AssignmentResponse,
    pub submissions: Vec<SubmissionResponse>,
}

impl From<AssignmentDetail> for AssignmentDetailResponse {
    fn from(detail: AssignmentDetail) -> Self {
        Self {
            assignment: detail.summary.into(),
            submissions: detail.submissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentGradeBrief {
    pub id: Uuid,
    pub score: Option<f64>,
    pub max_score: f64,
    pub comment: Option<String>,
    pub status: GradeStatus,
}

impl From<grades::Model> for StudentGradeBrief {
    fn from(grade: grades::Model) -> Self {
        Self {
            id: grade.id,
            score: grade.score,
            max_score: grade.max_score,
            comment: grade.comment,
            status: grade.status,
        }
    }
}

/// An assignment with the caller's own submission and grade
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentAssignmentResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub class_id: Uuid,
    pub class_name: String,
    pub subject: String,
    pub due_date: NaiveDate,
    pub max_score: f64,
    pub assignment_status: DisplayStatus,
    /// Submission status, `pending` before submitting
    pub status: String,
    pub submission_id: Option<Uuid>,
    pub submission_date: Option<DateTime<Utc>>,
    pub file_path: Option<String>,
    pub grade: Option<StudentGradeBrief>,
}

impl From<StudentAssignment> for StudentAssignmentResponse {
    fn from(row: StudentAssignment) -> Self {
        let assignment = row.assignment;
        let submission = row.submission;

        Self {
            id: assignment.id,
            title: assignment.title,
            description: assignment.description,
            class_id: row.class.id,
            class_name: row.class.name,
            subject: row.class.subject,
            due_date: assignment.due_date,
            max_score: assignment.max_score,
            assignment_status: row.display_status,
            status: submission
                .as_ref()
                .map(|s| s.status.to_string())
                .unwrap_or_else(|| "pending".to_string()),
            submission_id: submission.as_ref().map(|s| s.id),
            submission_date: submission.as_ref().map(|s| s.submission_date),
            file_path: submission.and_then(|s| s.file_path),
            grade: row.grade.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusFilter {
    /// Case-insensitive match on the assignment or submission status
    pub status_filter: Option<String>,
}

/// Multipart body of a submission
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SubmissionUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub notes: Option<String>,
}
