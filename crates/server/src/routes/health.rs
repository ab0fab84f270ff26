use crate::state::AppState;
use axum::{extract::State, http::StatusCode};
use log::error;

/// Returns "OK" when the database answers
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are reachable", content_type = "text/plain", body = String),
        (status = 503, description = "Database is unreachable", content_type = "text/plain", body = String)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(err) => {
            error!("Health check failed: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}
