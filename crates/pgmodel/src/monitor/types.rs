use crate::qb::{BuiltQuery, Verb};
use std::fmt;
use std::time::Duration;

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Which model verb produced the statement.
    pub verb: Verb,
    /// Table identifier the statement targets.
    pub table: String,
    /// The SQL statement sent to Postgres.
    pub sql: String,
    /// Parameter list rendered as a JSON array.
    pub params: String,
    /// Number of parameters.
    pub param_count: usize,
}

impl QueryContext {
    /// Capture the context of a built query.
    pub fn new(query: &BuiltQuery) -> Self {
        Self {
            verb: query.verb,
            table: query.table.clone(),
            sql: query.sql.clone(),
            params: query.params.to_string(),
            param_count: query.params.len(),
        }
    }
}

impl From<&BuiltQuery> for QueryContext {
    fn from(query: &BuiltQuery) -> Self {
        Self::new(query)
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Result of a statement execution for monitoring purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Statement returned rows.
    Rows(usize),
    /// Statement affected rows without returning them.
    Affected(u64),
    /// Statement failed with an error (truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating the message to avoid log explosion.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            let mut end = MAX_ERROR_LEN;
            while !msg.is_char_boundary(end) {
                end -= 1;
            }
            Self::Error(format!("{}...", &msg[..end]))
        } else {
            Self::Error(msg)
        }
    }

    /// Whether the statement failed.
    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Trait for observing statement execution.
///
/// The executor calls the monitor once per statement, after the connection
/// has been released. Implementations must not fail; anything that can go
/// wrong inside a monitor is handled there.
pub trait QueryMonitor: Send + Sync {
    /// Called after a statement completes (success or failure).
    ///
    /// # Arguments
    /// * `ctx` - Statement context
    /// * `duration` - Time from acquisition to result
    /// * `result` - The outcome of the statement
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);
}
