use clap::Parser;
use database::db::PoolOptions;
use log::warn;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};

/// Signing key used when `SECRET_KEY` is not set. Only suitable for development.
pub const DEV_SECRET_KEY: &str = "development-secret-key-change-me";

#[derive(Debug, Clone, Parser)]
#[command(name = "school-server", about = "School management API")]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://school.db?mode=rwc")]
    pub database_url: String,

    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    #[arg(long, env = "ACCESS_TOKEN_EXPIRE_MINUTES", default_value_t = 30)]
    pub access_token_expire_minutes: i64,

    /// Comma separated list of allowed origins, `*` allows any
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    #[arg(long, env = "DB_MIN_CONNECTIONS", help = "Min connections")]
    pub db_min_connections: Option<u32>,

    #[arg(long, env = "DB_MAX_CONNECTIONS", help = "Max connections")]
    pub db_max_connections: Option<u32>,
}

impl Config {
    pub fn secret_key(&self) -> &str {
        match self.secret_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => {
                warn!("SECRET_KEY is not set, using the development key");
                DEV_SECRET_KEY
            }
        }
    }

    pub fn pool_options(&self) -> PoolOptions {
        let defaults = PoolOptions::default();
        PoolOptions {
            min_connections: self.db_min_connections.or(defaults.min_connections),
            max_connections: self.db_max_connections.or(defaults.max_connections),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_token_expire_minutes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let config = Config::try_parse_from([
            "school-server",
            "--database-url",
            "sqlite::memory:",
            "--secret-key",
            "s3cret",
            "--cors-origins",
            "http://localhost:3000,https://school.example",
            "--port",
            "9000",
            "--db-max-connections",
            "4",
        ])
        .unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.secret_key(), "s3cret");
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://school.example"]
        );
        assert_eq!(config.socket_addr().port(), 9000);
        assert_eq!(config.pool_options().max_connections, Some(4));
    }

    #[test]
    fn test_empty_secret_falls_back() {
        let config = Config::try_parse_from(["school-server", "--secret-key", ""]).unwrap();
        assert_eq!(config.secret_key(), DEV_SECRET_KEY);
    }
}
