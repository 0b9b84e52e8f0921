//! Statement monitoring for the executor.
//!
//! This module provides:
//! - The [`QueryMonitor`] trait the executor reports every statement to
//! - An append-only file log ([`FileLogMonitor`]) with a quiet production mode
//! - A `tracing` monitor and a composite that fans out to several monitors
//!
//! # Example
//!
//! ```rust,ignore
//! use pgmodel::monitor::{CompositeMonitor, FileLogMonitor, LogConfig, TracingMonitor};
//!
//! let monitor = CompositeMonitor::new()
//!     .add(FileLogMonitor::new(LogConfig::new().with_path("queries.log")))
//!     .add(TracingMonitor::new());
//!
//! let executor = StatementExecutor::new(pool).with_monitor(monitor);
//! ```

mod config;
mod monitors;
mod types;


pub use config::{DEFAULT_LOG_PATH, ExecMode, LogConfig};
pub use monitors::{CompositeMonitor, FileLogMonitor, LogError, NoopMonitor, TracingMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult};
