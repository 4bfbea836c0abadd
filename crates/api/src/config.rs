use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use ideaflow_workflow::WorkflowConfig;

/// Which [`EntityStore`](ideaflow_db::EntityStore) implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields except `DATABASE_URL` have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub store_backend: StoreBackend,
    /// Required when `store_backend` is `Postgres`.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Root directory for uploaded attachment bytes.
    pub attachment_dir: PathBuf,
    /// Directory of the durable key-value store holding the undo slot.
    pub state_dir: PathBuf,
    pub workflow: WorkflowConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `STORE_BACKEND`            | `postgres`              |
    /// | `DATABASE_URL`             | required for postgres   |
    /// | `DATABASE_MAX_CONNECTIONS` | `20`                    |
    /// | `ATTACHMENT_DIR`           | `./data/attachments`    |
    /// | `STATE_DIR`                | `./data/state`          |
    /// | `UNDO_WINDOW_SECS`         | `300`                   |
    /// | `UNDO_REVALIDATE_ON_USE`   | `false`                 |
    /// | `TRAIL_SCAN_LIMIT`         | `500`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reads values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = WorkflowConfig::default();

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;

        let raw_origins = lookup("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into());
        let cors_origins: Vec<String> = raw_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.clone(),
                reason: e.to_string(),
            })?;
        }

        let request_timeout_secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let store_backend: StoreBackend = parse_or(&lookup, "STORE_BACKEND", StoreBackend::Postgres)?;

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let database_max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20)?;

        let attachment_dir =
            PathBuf::from(lookup("ATTACHMENT_DIR").unwrap_or_else(|| "./data/attachments".into()));
        let state_dir = PathBuf::from(lookup("STATE_DIR").unwrap_or_else(|| "./data/state".into()));

        let undo_window_secs: i64 = parse_or(&lookup, "UNDO_WINDOW_SECS", defaults.undo_window_secs)?;
        if undo_window_secs <= 0 {
            return Err(ConfigError::Invalid {
                var: "UNDO_WINDOW_SECS",
                value: undo_window_secs.to_string(),
                reason: "must be positive".into(),
            });
        }
        let undo_revalidate_on_use: bool = parse_or(
            &lookup,
            "UNDO_REVALIDATE_ON_USE",
            defaults.undo_revalidate_on_use,
        )?;
        let trail_scan_limit: i64 = parse_or(&lookup, "TRAIL_SCAN_LIMIT", defaults.trail_scan_limit)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store_backend,
            database_url,
            database_max_connections,
            attachment_dir,
            state_dir,
            workflow: WorkflowConfig {
                undo_window_secs,
                undo_revalidate_on_use,
                trail_scan_limit,
                ..defaults
            },
        })
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
