use log::LevelFilter;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Pool settings for [`create_connection`]
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub min_connections: Option<u32>,
    pub max_connections: Option<u32>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_connections: None,
            max_connections: Some(10),
        }
    }
}

/// Creates a pooled database connection
pub async fn create_connection(
    database_url: &str,
    pool: &PoolOptions,
) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    if let Some(min) = pool.min_connections {
        options.min_connections(min);
    }
    if let Some(max) = pool.max_connections {
        options.max_connections(max);
    }

    Database::connect(options).await
}
