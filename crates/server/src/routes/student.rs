use crate::{
    dtos::{
        assignment::{
            StatusFilter, StudentAssignmentResponse, SubmissionResponse, SubmissionUpload,
        },
        attendance::{StudentAttendanceQuery, StudentAttendanceResponse},
        class::StudentClassResponse,
        grade::{StudentGradeQuery, StudentGradeResponse},
        report::StudentScheduleResponse,
        user::UserResponse,
    },
    error::{ApiError, ApiResult},
    extract::StudentUser,
    state::AppState,
};
use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use database::services::{
    assignments::{AssignmentService, Upload},
    attendance::AttendanceService,
    grades::GradeService,
    reports::ReportService,
    users::UserService,
};
use uuid::Uuid;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/classes", get(classes))
        .route("/assignments", get(assignments))
        .route("/assignments/{id}/submit", post(submit_assignment))
        .route("/grades", get(grades))
        .route("/attendance", get(attendance))
        .route("/schedule", get(schedule))
}

#[utoipa::path(
    get,
    path = "/student/profile",
    responses(
        (status = 200, description = "Student profile", body = UserResponse),
        (status = 403, description = "Student access required")
    ),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn profile(
    State(state): State<AppState>,
    student: StudentUser,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserService::get(&state.db, student.id).await?.into()))
}

/// Active classes the caller is enrolled in
#[utoipa::path(
    get,
    path = "/student/classes",
    responses((status = 200, description = "Enrolled classes", body = Vec<StudentClassResponse>)),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn classes(
    State(state): State<AppState>,
    student: StudentUser,
) -> ApiResult<Json<Vec<StudentClassResponse>>> {
    let classes = ReportService::student_classes(&state.db, student.id).await?;
    Ok(Json(classes.into_iter().map(Into::into).collect()))
}

/// Assignments of the caller's classes with their own submission and grade
#[utoipa::path(
    get,
    path = "/student/assignments",
    params(StatusFilter),
    responses((status = 200, description = "Assignments", body = Vec<StudentAssignmentResponse>)),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn assignments(
    State(state): State<AppState>,
    student: StudentUser,
    Query(query): Query<StatusFilter>,
) -> ApiResult<Json<Vec<StudentAssignmentResponse>>> {
    let today = Utc::now().date_naive();
    let assignments = AssignmentService::student_assignments(
        &state.db,
        student.id,
        query.status_filter.as_deref(),
        today,
    )
    .await?;

    Ok(Json(assignments.into_iter().map(Into::into).collect()))
}

/// Submits a file for an assignment. Each assignment accepts one submission per student.
#[utoipa::path(
    post,
    path = "/student/assignments/{id}/submit",
    params(("id" = Uuid, Path, description = "Assignment id")),
    request_body(content = SubmissionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Submission recorded", body = SubmissionResponse),
        (status = 400, description = "Missing file"),
        (status = 404, description = "Assignment not found"),
        (status = 409, description = "Already submitted or no longer accepting submissions")
    ),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn submit_assignment(
    State(state): State<AppState>,
    student: StudentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmissionResponse>)> {
    let mut upload = None;
    let mut notes = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                upload = Some(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("notes" | "content") => {
                let text = field.text().await?;
                if !text.trim().is_empty() {
                    notes = Some(text);
                }
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;
    let submission =
        AssignmentService::submit(&state.db, &state.files, id, student.id, upload, notes).await?;

    Ok((StatusCode::CREATED, Json(submission.into())))
}

#[utoipa::path(
    get,
    path = "/student/grades",
    params(StudentGradeQuery),
    responses((status = 200, description = "Grades, newest first", body = Vec<StudentGradeResponse>)),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn grades(
    State(state): State<AppState>,
    student: StudentUser,
    Query(query): Query<StudentGradeQuery>,
) -> ApiResult<Json<Vec<StudentGradeResponse>>> {
    let grades = GradeService::student_grades(&state.db, student.id, query.class_id).await?;
    Ok(Json(grades.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/student/attendance",
    params(StudentAttendanceQuery),
    responses(
        (status = 200, description = "Attendance, newest first", body = Vec<StudentAttendanceResponse>),
        (status = 422, description = "start_date after end_date")
    ),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn attendance(
    State(state): State<AppState>,
    student: StudentUser,
    Query(query): Query<StudentAttendanceQuery>,
) -> ApiResult<Json<Vec<StudentAttendanceResponse>>> {
    let records = AttendanceService::student_attendance(
        &state.db,
        student.id,
        query.start_date,
        query.end_date,
        query.class_id,
    )
    .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/student/schedule",
    responses((status = 200, description = "Weekly meetings of enrolled classes", body = Vec<StudentScheduleResponse>)),
    security(("jwt" = [])),
    tag = "Student"
)]
pub async fn schedule(
    State(state): State<AppState>,
    student: StudentUser,
) -> ApiResult<Json<Vec<StudentScheduleResponse>>> {
    let entries = ReportService::student_schedule(&state.db, student.id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
