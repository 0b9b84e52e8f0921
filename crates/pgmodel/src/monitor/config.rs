use std::path::{Path, PathBuf};

/// Default location of the diagnostic query log.
pub const DEFAULT_LOG_PATH: &str = "queries.log";

/// Execution mode of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Every statement is written to the query log.
    #[default]
    Development,
    /// Quiet mode: only failures reach the query log.
    Production,
}

impl ExecMode {
    /// Parse an `APP_ENV`-style value. Only `production` (any case) is quiet.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            ExecMode::Production
        } else {
            ExecMode::Development
        }
    }

    /// Whether successful statements are left out of the log.
    pub fn is_quiet(self) -> bool {
        self == ExecMode::Production
    }
}

/// Configuration for the file query log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Path of the append-only log file.
    pub path: PathBuf,
    /// Execution mode.
    pub mode: ExecMode,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_LOG_PATH),
            mode: ExecMode::Development,
        }
    }
}

impl LogConfig {
    /// Create a configuration with defaults (`queries.log`, development mode).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log file path.
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Set the execution mode.
    pub fn with_mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    /// Shorthand for `with_mode(ExecMode::Production)`.
    pub fn quiet(self) -> Self {
        self.with_mode(ExecMode::Production)
    }
}
