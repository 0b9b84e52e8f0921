//! Environment configuration.
//!
//! | Variable           | Meaning                         | Default       |
//! |--------------------|---------------------------------|---------------|
//! | `DATABASE_URL`     | Postgres connection string      | required      |
//! | `DB_POOL_MAX_SIZE` | Maximum pooled connections      | 16            |
//! | `QUERY_LOG_PATH`   | Append-only query log file      | `queries.log` |
//! | `APP_ENV`          | `production` enables quiet mode | development   |
//!
//! [`DbConfig::from_env`] loads a `.env` file first when one is present.

use crate::error::{ModelError, ModelResult};
use crate::monitor::{
    CompositeMonitor, DEFAULT_LOG_PATH, ExecMode, FileLogMonitor, LogConfig, TracingMonitor,
};
use std::fmt;

/// Pool size used when `DB_POOL_MAX_SIZE` is unset.
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Connection and logging settings, supplied once at start-up.
#[derive(Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub pool_max_size: usize,
    pub log: LogConfig,
}

impl DbConfig {
    /// Create a configuration for `database_url` with default pool and log settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_max_size: DEFAULT_POOL_SIZE,
            log: LogConfig::default(),
        }
    }

    /// Read the process environment, after loading `.env` if present.
    pub fn from_env() -> ModelResult<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(ModelError::Config(format!("cannot load .env: {err}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ModelResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ModelError::Config("DATABASE_URL is not set".into()))?;

        let pool_max_size = match lookup("DB_POOL_MAX_SIZE") {
            None => DEFAULT_POOL_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ModelError::Config(format!(
                        "DB_POOL_MAX_SIZE must be a positive integer, got `{raw}`"
                    )));
                }
            },
        };

        let path = lookup("QUERY_LOG_PATH")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string());
        let mode = lookup("APP_ENV")
            .map(|env| ExecMode::from_env_value(&env))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            pool_max_size,
            log: LogConfig::new().with_path(path).with_mode(mode),
        })
    }

    /// Override the pool size.
    pub fn with_pool_max_size(mut self, max_size: usize) -> Self {
        self.pool_max_size = max_size;
        self
    }

    /// Override the log configuration.
    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// The configured execution mode.
    pub fn exec_mode(&self) -> ExecMode {
        self.log.mode
    }

    /// Monitor used by [`Models::connect`](crate::Models::connect): the file
    /// log plus a `tracing` event per statement.
    pub fn monitor(&self) -> CompositeMonitor {
        CompositeMonitor::new()
            .add(FileLogMonitor::new(self.log.clone()))
            .add(TracingMonitor::new())
    }

    /// Create the connection pool described by this configuration.
    #[cfg(feature = "pool")]
    pub fn create_pool(&self) -> ModelResult<deadpool_postgres::Pool> {
        crate::pool::create_pool_with_size(&self.database_url, self.pool_max_size)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_url", &"<redacted>")
            .field("pool_max_size", &self.pool_max_size)
            .field("log", &self.log)
            .finish()
    }
}
