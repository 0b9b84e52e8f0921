//! Error types for pgmodel

use thiserror::Error;

/// Result type alias for pgmodel operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for data-access operations
#[derive(Debug, Error)]
pub enum ModelError {
    /// Arguments that would render invalid or unintended SQL
    #[error("Build error: {0}")]
    Build(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error, carrying the server's message when there is one
    #[error("Query error: {}", driver_message(.0))]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// A statement that must return a row returned none
    #[error("Not found: {0}")]
    NotFound(String),

    /// Result column could not be represented as a record value
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Typed adapter conversion error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid environment configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl ModelError {
    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this error was raised before any SQL reached the driver
    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific ModelError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

/// Render a driver error with its cause.
///
/// The driver's own `Display` stops at its error kind ("db error"); the
/// server's severity, message, detail and hint live in the source.
fn driver_message(err: &tokio_postgres::Error) -> String {
    let kind = err.to_string();
    let cause = match err.as_db_error() {
        Some(db) => db.to_string(),
        None => match std::error::Error::source(err) {
            Some(source) => source.to_string(),
            None => return kind,
        },
    };
    if kind.ends_with(&cause) {
        kind
    } else {
        format!("{kind}: {cause}")
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ModelError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
