use crate::{
    dtos::attendance::{AttendanceMark, AttendanceQuery, AttendanceResponse, AttendanceUpdate},
    error::{ApiError, ApiResult},
    extract::TeacherUser,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use database::services::attendance::AttendanceService;
use uuid::Uuid;

/// Attendance of a class on a date. Students without a mark are recorded as absent.
#[utoipa::path(
    get,
    path = "/teacher/classes/{id}/attendance",
    params(("id" = Uuid, Path, description = "Class id"), AttendanceQuery),
    responses(
        (status = 200, description = "One record per enrolled student", body = Vec<AttendanceResponse>),
        (status = 400, description = "Missing date"),
        (status = 404, description = "Class not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn class_attendance(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Query(query): Query<AttendanceQuery>,
) -> ApiResult<Json<Vec<AttendanceResponse>>> {
    let date = query
        .date
        .ok_or_else(|| ApiError::BadRequest("date query parameter is required".to_string()))?;

    let rows = AttendanceService::for_date(&state.db, teacher.id, id, date).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/teacher/classes/{id}/attendance",
    params(("id" = Uuid, Path, description = "Class id")),
    request_body = AttendanceMark,
    responses(
        (status = 200, description = "Stored records", body = Vec<AttendanceResponse>),
        (status = 404, description = "Class not found or student not enrolled"),
        (status = 422, description = "No records given")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AttendanceMark>,
) -> ApiResult<Json<Vec<AttendanceResponse>>> {
    let entries = body.records.into_iter().map(Into::into).collect();
    let records = AttendanceService::mark(&state.db, teacher.id, id, body.date, entries).await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/teacher/attendance/{id}",
    params(("id" = Uuid, Path, description = "Attendance record id")),
    request_body = AttendanceUpdate,
    responses(
        (status = 200, description = "Updated record", body = AttendanceResponse),
        (status = 404, description = "Attendance record not found")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn update_attendance(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AttendanceUpdate>,
) -> ApiResult<Json<AttendanceResponse>> {
    let record =
        AttendanceService::update(&state.db, teacher.id, id, body.status, body.notes).await?;
    Ok(Json(record.into()))
}
