use crate::{
    dtos::{
        class::{ClassResponse, EnrolledStudentResponse, TeacherClassResponse},
        report::ClassStatsResponse,
    },
    error::ApiResult,
    extract::TeacherUser,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};
use database::{
    ServiceError,
    services::{classes::ClassService, reports::ReportService, roster::RosterService},
};
use uuid::Uuid;

/// The caller's active classes with their latest assignments
#[utoipa::path(
    get,
    path = "/teacher/classes",
    responses((status = 200, description = "Active classes", body = Vec<TeacherClassResponse>)),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn list_classes(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> ApiResult<Json<Vec<TeacherClassResponse>>> {
    let classes = ReportService::teacher_classes(&state.db, teacher.id).await?;
    Ok(Json(classes.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/teacher/classes/{id}",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Class with its roster", body = ClassResponse),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn get_class(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClassResponse>> {
    Ok(Json(ReportService::teacher_class(&state.db, teacher.id, id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/teacher/classes/{id}/students",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Actively enrolled students", body = Vec<EnrolledStudentResponse>),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn class_students(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<EnrolledStudentResponse>>> {
    ClassService::owned(&state.db, id, teacher.id).await?;
    let students = RosterService::class_students(&state.db, id)
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(students.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/teacher/classes/{id}/stats",
    params(("id" = Uuid, Path, description = "Class id")),
    responses(
        (status = 200, description = "Assignment and grade figures", body = ClassStatsResponse),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn class_stats(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ClassStatsResponse>> {
    Ok(Json(ReportService::class_stats(&state.db, teacher.id, id).await?.into()))
}
