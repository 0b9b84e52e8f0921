//! # pgmodel
//!
//! A schema-less Postgres data-access layer.
//!
//! ## Features
//!
//! - **Loosely typed verbs**: `find_many`, `find_unique`, `create`, `update`,
//!   `delete`, `count` over any table, driven by [`Filter`] and [`Record`]
//! - **Two casings**: callers use camelCase keys, columns are snake_case
//! - **Parameterized SQL**: values are always bound as `$n` parameters
//! - **Safe defaults**: DELETE/UPDATE require a filter or an explicit [`Filter::all`]
//! - **Pooled execution**: one connection per statement, always returned to the pool
//! - **Query log**: append-only file log plus `tracing` events
//!
//! ## Example
//!
//! ```ignore
//! use pgmodel::{DbConfig, Filter, Models, Record};
//!
//! let models = Models::connect(&DbConfig::from_env()?)?;
//!
//! let available = models
//!     .unit
//!     .find_many(&Filter::new().eq("propertyId", 3).eq("status", "available"))
//!     .await?;
//!
//! models
//!     .unit
//!     .update(&Filter::new().eq("id", 42), &Record::new().with("rentAmount", 1500))
//!     .await?;
//! ```

pub mod case;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod ident;
pub mod model;
pub mod models;
pub mod monitor;
pub mod qb;
pub mod record;
pub mod row;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
pub(crate) mod fake;

pub use case::{to_api_key, to_api_record, to_storage_key, to_storage_record};
pub use client::{ConnectionPool, GenericClient};
pub use config::DbConfig;
pub use error::{ModelError, ModelResult};
pub use executor::StatementExecutor;
pub use model::{Deleted, ModelHandle, TypedModel};
pub use models::{Models, TABLES};
pub use monitor::{
    CompositeMonitor, ExecMode, FileLogMonitor, LogConfig, NoopMonitor, QueryContext,
    QueryMonitor, QueryResult, TracingMonitor,
};
pub use qb::{BuiltQuery, Condition, Filter, Order, ParamList, SqlValue, Verb};
pub use record::Record;
pub use row::decode_row;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_manager_config, create_pool_with_size};
