use crate::{config::Config, doc::ApiDoc, routes, state::AppState};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use log::info;
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the router with every route, the API docs and the shared layers
pub fn create_app(state: AppState, config: &Config) -> anyhow::Result<Router> {
    let api = Router::new()
        .route("/", get(routes::root::root))
        .route("/health", get(routes::health::health))
        .nest("/auth", routes::auth::routes())
        .nest("/admin", routes::admin::routes())
        .nest("/teacher", routes::teacher::routes())
        .nest("/student", routes::student::routes())
        .nest("/public", routes::public::routes())
        .with_state(state);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(log_request))
                .layer(cors(&config.cors_origins)?)
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        );

    Ok(app)
}

fn cors(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| origin.trim().parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(layer.allow_origin(origins).allow_credentials(true))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;
    info!(
        "{method} {path} -> {} ({:.2?})",
        response.status().as_u16(),
        started.elapsed()
    );

    response
}
