use crate::{
    dtos::{
        MessageResponse,
        assignment::{
            AssignmentCreate, AssignmentDetailResponse, AssignmentResponse, AssignmentUpdate,
            SubmissionResponse, parse_status,
        },
    },
    error::{ApiError, ApiResult},
    extract::TeacherUser,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use database::{
    ServiceError,
    services::{
        assignments::{AssignmentService, NewAssignment, parse_due_date},
        files::canonical_path,
    },
};
use log::{info, warn};
use std::io::ErrorKind;
use uuid::Uuid;

/// Every assignment of the caller with submission figures
#[utoipa::path(
    get,
    path = "/teacher/assignments",
    responses((status = 200, description = "Assignments", body = Vec<AssignmentResponse>)),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let today = Utc::now().date_naive();
    let assignments = AssignmentService::teacher_assignments(&state.db, teacher.id, today).await?;
    Ok(Json(assignments.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/teacher/classes/{id}/assignments",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Assignments of the class", body = Vec<AssignmentResponse>),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn class_assignments(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<AssignmentResponse>>> {
    let today = Utc::now().date_naive();
    let assignments =
        AssignmentService::class_assignments(&state.db, teacher.id, id, today).await?;
    Ok(Json(assignments.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/teacher/assignments",
    request_body = AssignmentCreate,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class is inactive"),
        (status = 422, description = "Invalid title, score, due date or status")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Json(body): Json<AssignmentCreate>,
) -> ApiResult<(StatusCode, Json<AssignmentResponse>)> {
    let new_assignment = NewAssignment {
        title: body.title,
        description: body.description,
        class_id: body.class_id,
        due_date: parse_due_date(&body.due_date)?,
        max_score: body.max_score,
        status: parse_status(body.status.as_deref())?.unwrap_or_default(),
    };

    let created = AssignmentService::create(&state.db, teacher.id, new_assignment).await?;
    let today = Utc::now().date_naive();
    let detail = AssignmentService::detail(&state.db, teacher.id, created.id, today).await?;

    Ok((StatusCode::CREATED, Json(detail.summary.into())))
}

#[utoipa::path(
    get,
    path = "/teacher/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Assignment with its submissions", body = AssignmentDetailResponse),
        (status = 404, description = "Assignment not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssignmentDetailResponse>> {
    let today = Utc::now().date_naive();
    Ok(Json(
        AssignmentService::detail(&state.db, teacher.id, id, today)
            .await?
            .into(),
    ))
}

#[utoipa::path(
    put,
    path = "/teacher/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment id")),
    request_body = AssignmentUpdate,
    responses(
        (status = 200, description = "Updated assignment", body = AssignmentResponse),
        (status = 404, description = "Assignment not found"),
        (status = 422, description = "Invalid field")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn update_assignment(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AssignmentUpdate>,
) -> ApiResult<Json<AssignmentResponse>> {
    AssignmentService::update(&state.db, teacher.id, id, body.try_into()?).await?;

    let today = Utc::now().date_naive();
    let detail = AssignmentService::detail(&state.db, teacher.id, id, today).await?;
    Ok(Json(detail.summary.into()))
}

/// Deletes an assignment with its grades and submissions
#[utoipa::path(
    delete,
    path = "/teacher/assignments/{id}",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Assignment deleted", body = MessageResponse),
        (status = 404, description = "Assignment not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn delete_assignment(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = AssignmentService::delete(&state.db, teacher.id, id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Assignment {} deleted",
        deleted.title
    ))))
}

#[utoipa::path(
    get,
    path = "/teacher/assignments/{id}/submissions",
    params(("id" = Uuid, Path, description = "Assignment id")),
    responses(
        (status = 200, description = "Submissions with their grades", body = Vec<SubmissionResponse>),
        (status = 404, description = "Assignment not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn submissions(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubmissionResponse>>> {
    let submissions = AssignmentService::submissions(&state.db, teacher.id, id).await?;
    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}

/// Downloads a submitted file. Only files submitted to the caller's assignments are served.
#[utoipa::path(
    get,
    path = "/teacher/uploads/assignments/assignments/submissions/{path}",
    params(("path" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream", body = Vec<u8>),
        (status = 404, description = "File not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn download_submission(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(path): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let not_found = || ApiError::NotFound("File not found".to_string());

    let relative = canonical_path(&path).ok_or_else(not_found)?;
    AssignmentService::owned_file(&state.db, teacher.id, &relative)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(_) => not_found(),
            other => other.into(),
        })?;

    let bytes = state.files.read(&relative).await.map_err(|err| match err.kind() {
        ErrorKind::NotFound => {
            warn!("Submission file {relative} is recorded but missing on disk");
            not_found()
        }
        _ => ApiError::Internal(format!("reading {relative}: {err}")),
    })?;
    info!("Teacher {} downloaded {relative}", teacher.email);

    let filename = relative.rsplit('/').next().unwrap_or_default().replace('"', "");
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
