use super::config::LogConfig;
use super::types::{QueryContext, QueryMonitor, QueryResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// A no-op monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

/// Failure to append to the query log.
///
/// Never leaves [`FileLogMonitor`]; it is reported with `tracing::warn!`.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot open query log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write query log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A monitor that appends one line per statement to a text file.
///
/// Successful statements produce
/// `QUERY: <rfc3339 timestamp> <sql> <params as JSON>` unless the configured
/// mode is quiet; failures always produce `[ERROR] <rfc3339 timestamp> <message>`.
/// Line breaks inside a message are folded into spaces, so every record is
/// exactly one line. The file is never rotated.
///
/// The file is opened in append mode on the first line and kept open; a
/// failed write drops the handle so the next line reopens the file. Writes
/// are blocking `std::fs` calls made on the thread that completed the
/// statement.
#[derive(Debug)]
pub struct FileLogMonitor {
    config: LogConfig,
    // Serializes appends from concurrent statements.
    file: Mutex<Option<File>>,
}

impl FileLogMonitor {
    /// Create a monitor from a log configuration.
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            file: Mutex::new(None),
        }
    }

    /// Create a development-mode monitor writing to `path`.
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self::new(LogConfig::new().with_path(path))
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Render the log line for an outcome, or `None` when quiet mode skips it.
    pub(crate) fn format_line(&self, ctx: &QueryContext, result: &QueryResult) -> Option<String> {
        let timestamp = chrono::Utc::now().to_rfc3339();
        match result {
            QueryResult::Error(message) => {
                Some(format!("[ERROR] {timestamp} {}", single_line(message)))
            }
            _ if self.config.mode.is_quiet() => None,
            _ => Some(format!(
                "QUERY: {timestamp} {} {}",
                single_line(&ctx.sql),
                ctx.params
            )),
        }
    }

    fn append(&self, line: &str) -> Result<(), LogError> {
        let mut slot = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let path = &self.config.path;
        let mut file = match slot.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LogError::Open {
                    path: path.clone(),
                    source,
                })?,
        };
        // A handle that failed to write is dropped and reopened next time.
        writeln!(file, "{line}").map_err(|source| LogError::Write {
            path: path.clone(),
            source,
        })?;
        *slot = Some(file);
        Ok(())
    }
}

/// Fold CR/LF runs into single spaces.
pub(super) fn single_line(text: &str) -> std::borrow::Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return text.into();
    }
    text.split(['\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .into()
}

impl QueryMonitor for FileLogMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, _duration: Duration, result: &QueryResult) {
        let Some(line) = self.format_line(ctx, result) else {
            return;
        };
        if let Err(err) = self.append(&line) {
            tracing::warn!(target: "pgmodel.sql", error = %err, "query log write failed");
        }
    }
}

/// A `tracing`-based monitor that emits one event per completed statement.
///
/// Failed statements are always emitted at `WARN`; successful ones at the
/// configured level (`DEBUG` by default).
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Tracing event level for successful statements.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingMonitor {
    /// Create a new monitor with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while end > 0 && !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end])
            }
            _ => sql.to_string(),
        }
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(&ctx.sql);
        let level = if result.is_error() {
            Level::WARN
        } else {
            self.level
        };
        emit_at_level!(
            level,
            target: "pgmodel.sql",
            verb = %ctx.verb,
            table = %ctx.table,
            param_count = ctx.param_count,
            duration_ms = duration.as_secs_f64() * 1000.0,
            result = %result,
            sql = %sql,
        );
    }
}

/// A composite monitor that delegates to multiple monitors.
#[derive(Clone, Default)]
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    /// Create an empty composite monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a monitor.
    #[allow(clippy::should_implement_trait)]
    pub fn add<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    /// Add an Arc-wrapped monitor.
    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    /// Number of delegated monitors.
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    /// Whether no monitor has been added.
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for monitor in &self.monitors {
            monitor.on_query_complete(ctx, duration, result);
        }
    }
}
