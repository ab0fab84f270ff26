use anyhow::Context;
use clap::Parser;
use database::{db::create_connection, services::files::SubmissionFiles};
use log::info;
use migration::{Migrator, MigratorTrait};
use server::{
    app::create_app, auth::TokenKeys, config::Config, state::AppState,
    utils::shutdown::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::parse();

    let db = create_connection(&config.database_url, &config.pool_options())
        .await
        .context("failed to connect to the database")?;
    Migrator::up(&db, None)
        .await
        .context("failed to run migrations")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;

    let state = AppState {
        db,
        tokens: TokenKeys::new(config.secret_key().as_bytes(), config.token_ttl()),
        files: SubmissionFiles::new(&config.upload_dir),
    };
    let app = create_app(state, &config)?;

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{addr}, docs at http://{addr}/swagger-ui");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
