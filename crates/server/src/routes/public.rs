use crate::{
    dtos::user::UserResponse,
    error::{ApiError, ApiResult},
    state::AppState,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use database::services::users::UserService;
use models::Role;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/role/{role}", get(users_by_role))
}

/// Every account
#[utoipa::path(
    get,
    path = "/public/users",
    responses((status = 200, description = "All accounts", body = Vec<UserResponse>)),
    tag = "Public"
)]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserResponse>>> {
    let users = UserService::list(&state.db, None).await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Accounts holding one role
#[utoipa::path(
    get,
    path = "/public/users/role/{role}",
    params(("role" = String, Path, description = "admin, teacher, student or parent")),
    responses(
        (status = 200, description = "Accounts with the role", body = Vec<UserResponse>),
        (status = 400, description = "Unknown role"),
        (status = 404, description = "No account has the role")
    ),
    tag = "Public"
)]
pub async fn users_by_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let role: Role = role
        .parse()
        .map_err(|err: models::role::ParseEnumError| ApiError::BadRequest(err.to_string()))?;

    let users = UserService::list(&state.db, Some(role)).await?;
    if users.is_empty() {
        return Err(ApiError::NotFound(format!("No users found with role {role}")));
    }

    Ok(Json(users.into_iter().map(Into::into).collect()))
}
