use crate::{
    dtos::{
        report::{ActivityResponse, DashboardStatsResponse, TeacherScheduleResponse},
        user::{TeacherProfileUpdate, UserResponse},
    },
    error::ApiResult,
    extract::TeacherUser,
    state::AppState,
};
use axum::{Json, extract::State};
use chrono::Utc;
use database::services::{reports::ReportService, users::UserService};
use models::Role;

/// The caller's profile. An empty subject is filled from their first active class.
#[utoipa::path(
    get,
    path = "/teacher/profile",
    responses(
        (status = 200, description = "Teacher profile", body = UserResponse),
        (status = 403, description = "Teacher access required")
    ),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserService::teacher_profile(&state.db, teacher.id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/teacher/profile",
    request_body = TeacherProfileUpdate,
    responses((status = 200, description = "Updated profile", body = UserResponse)),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    teacher: TeacherUser,
    Json(body): Json<TeacherProfileUpdate>,
) -> ApiResult<Json<UserResponse>> {
    let updated = UserService::update(&state.db, teacher.id, Some(Role::Teacher), body.into()).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/teacher/dashboard/stats",
    responses((status = 200, description = "Totals over the caller's active classes", body = DashboardStatsResponse)),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> ApiResult<Json<DashboardStatsResponse>> {
    let today = Utc::now().date_naive();
    Ok(Json(
        ReportService::teacher_dashboard(&state.db, teacher.id, today)
            .await?
            .into(),
    ))
}

/// Latest submissions, attendance marks and grades, newest first
#[utoipa::path(
    get,
    path = "/teacher/activities",
    responses((status = 200, description = "Up to 10 recent activities", body = Vec<ActivityResponse>)),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn activities(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    let activities = ReportService::activities(&state.db, teacher.id).await?;
    Ok(Json(activities.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/teacher/schedule",
    responses((status = 200, description = "Weekly meetings of the caller's classes", body = Vec<TeacherScheduleResponse>)),
    security(("jwt" = [])),
    tag = "Teacher"
)]
pub async fn schedule(
    State(state): State<AppState>,
    teacher: TeacherUser,
) -> ApiResult<Json<Vec<TeacherScheduleResponse>>> {
    let entries = ReportService::teacher_schedule(&state.db, teacher.id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}
