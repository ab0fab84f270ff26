/// Liveness text for the API root
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "API is up", content_type = "text/plain", body = String)
    ),
    tag = "Health"
)]
pub async fn root() -> &'static str {
    "OK"
}
