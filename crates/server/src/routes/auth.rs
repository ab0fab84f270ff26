use crate::{
    dtos::{
        auth::{TokenForm, TokenResponse},
        user::{UserCreate, UserResponse},
    },
    error::{ApiError, ApiResult},
    extract::CurrentUser,
    state::AppState,
};
use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use database::services::users::UserService;
use log::info;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/token", post(token))
        .route("/register", post(register))
        .route("/me", get(me))
}

/// Exchanges email and password for a bearer token
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body(content = TokenForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Incorrect email or password"),
        (status = 400, description = "Unsupported grant type")
    ),
    tag = "Authentication"
)]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> ApiResult<Json<TokenResponse>> {
    if let Some(grant_type) = form.grant_type.as_deref() {
        if !grant_type.is_empty() && grant_type != "password" {
            return Err(ApiError::BadRequest(format!(
                "Unsupported grant_type {grant_type:?}"
            )));
        }
    }

    let account = UserService::authenticate(&state.db, &form.username, &form.password).await?;
    let access_token = state.tokens.issue(&account.email)?;
    info!("Issued token for {}", account.email);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user_role: account.role,
    }))
}

/// Creates an account with the requested role
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = UserCreate,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid account data")
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<UserCreate>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role = body
        .role
        .ok_or_else(|| ApiError::Validation("role is required".to_string()))?;

    let user = UserService::register(&state.db, body.into_new_user(role)).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// The account behind the token
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("jwt" = [])),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(account): CurrentUser,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(UserService::get(&state.db, account.id).await?.into()))
}
