pub mod classes;
pub mod users;

use crate::{
    dtos::report::AdminStatsResponse, error::ApiResult, extract::AdminUser, state::AppState,
};
use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use database::services::reports::ReportService;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/students", get(users::list_students).post(users::create_student))
        .route("/students/promote", post(users::promote_students))
        .route(
            "/students/{id}",
            get(users::get_student).put(users::update_student).delete(users::delete_student),
        )
        .route("/teachers", get(users::list_teachers).post(users::create_teacher))
        .route(
            "/teachers/{id}",
            get(users::get_teacher).put(users::update_teacher).delete(users::delete_teacher),
        )
        .route("/parents", get(users::list_parents).post(users::create_parent))
        .route(
            "/parents/{id}",
            get(users::get_parent).put(users::update_parent).delete(users::delete_parent),
        )
        .route("/parents/{id}/students", get(users::parent_students))
        .route(
            "/parents/{id}/students/{student_id}",
            post(users::link_student).delete(users::unlink_student),
        )
        .route("/classes", get(classes::list_classes).post(classes::create_class))
        .route(
            "/classes/{id}",
            get(classes::get_class).put(classes::update_class).delete(classes::delete_class),
        )
        .route(
            "/classes/{id}/enrollments",
            get(classes::list_enrollments).post(classes::enroll_students),
        )
        .route("/classes/{id}/enrollments/{student_id}", delete(classes::drop_student))
        .route("/stats", get(stats))
}

/// School-wide counts
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Account and class counts", body = AdminStatsResponse),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<AdminStatsResponse>> {
    Ok(Json(ReportService::admin_stats(&state.db).await?.into()))
}
