//! Per-table handles exposing the six verbs.
//!
//! A [`ModelHandle`] is a table identifier plus a shared executor. Callers
//! speak API casing (`unitNumber`); the handle converts keys to storage casing
//! (`unit_number`) on the way in and back on the way out.
//!
//! ```ignore
//! let units = ModelHandle::new("Unit", executor.clone());
//!
//! let unit = units
//!     .create(&Record::new().with("unitNumber", "A1").with("rentAmount", 1200))
//!     .await?;
//! let id = unit.get("id").cloned().unwrap_or_default();
//! let found = units.find_unique(&Filter::new().eq("id", id)).await?;
//! ```

use crate::case::{to_api_record, to_api_record_opt};
use crate::client::ConnectionPool;
use crate::error::{ModelError, ModelResult};
use crate::executor::StatementExecutor;
use crate::qb::{self, Filter};
use crate::record::{Record, json_kind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Outcome of a `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub success: bool,
    pub rows_affected: u64,
}

/// Data-access handle for one table.
pub struct ModelHandle<P> {
    table: &'static str,
    executor: Arc<StatementExecutor<P>>,
}

impl<P> Clone for ModelHandle<P> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<P> fmt::Debug for ModelHandle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<P: ConnectionPool> ModelHandle<P> {
    /// Bind a table identifier to an executor.
    ///
    /// The identifier is quoted but otherwise trusted.
    pub fn new(table: &'static str, executor: Arc<StatementExecutor<P>>) -> Self {
        Self { table, executor }
    }

    /// The table this handle targets.
    pub fn table(&self) -> &'static str {
        self.table
    }

    /// The shared executor.
    pub fn executor(&self) -> &Arc<StatementExecutor<P>> {
        &self.executor
    }

    /// View this handle through a serde type.
    pub fn typed<T>(&self) -> TypedModel<T, P> {
        TypedModel {
            handle: self.clone(),
            _marker: PhantomData,
        }
    }

    /// All rows matching `filter`, in storage order unless the filter orders them.
    pub async fn find_many(&self, filter: &Filter) -> ModelResult<Vec<Record>> {
        let query = qb::find_many(self.table, filter)?;
        if !filter.includes().is_empty() {
            tracing::trace!(
                target: "pgmodel.sql",
                table = self.table,
                include = ?filter.includes(),
                "include hints are not resolved"
            );
        }
        let rows = self.executor.fetch_all(&query).await?;
        Ok(rows.into_iter().map(to_api_record).collect())
    }

    /// The first row matching an equality-only filter, or `None`.
    pub async fn find_unique(&self, filter: &Filter) -> ModelResult<Option<Record>> {
        let query = qb::find_unique(self.table, filter)?;
        Ok(to_api_record_opt(self.executor.fetch_opt(&query).await?))
    }

    /// Insert one row and return it as stored, including database defaults.
    pub async fn create(&self, values: &Record) -> ModelResult<Record> {
        let query = qb::create(self.table, values)?;
        Ok(to_api_record(self.executor.fetch_one(&query).await?))
    }

    /// Update the rows matching `filter` and return the first updated row,
    /// or `None` when nothing matched.
    pub async fn update(&self, filter: &Filter, values: &Record) -> ModelResult<Option<Record>> {
        let query = qb::update(self.table, filter, values)?;
        Ok(to_api_record_opt(self.executor.fetch_opt(&query).await?))
    }

    /// Delete the rows matching `filter`.
    ///
    /// An empty filter is rejected before any connection is acquired; pass
    /// [`Filter::all`] to empty the table.
    pub async fn delete(&self, filter: &Filter) -> ModelResult<Deleted> {
        let query = qb::delete(self.table, filter)?;
        let rows_affected = self.executor.execute(&query).await?;
        Ok(Deleted {
            success: true,
            rows_affected,
        })
    }

    /// Number of rows matching `filter`.
    pub async fn count(&self, filter: &Filter) -> ModelResult<i64> {
        let query = qb::count(self.table, filter)?;
        match self.executor.fetch_opt(&query).await? {
            Some(row) => parse_count(&row),
            None => Ok(0),
        }
    }
}

// COUNT(*) is a bigint; older drivers and some poolers hand it back as text.
fn parse_count(row: &Record) -> ModelResult<i64> {
    let value = row
        .get("count")
        .ok_or_else(|| ModelError::decode("count", "missing from result"))?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| ModelError::decode("count", format!("{n} is not an integer"))),
        Value::String(s) => s
            .parse::<i64>()
            .map_err(|e| ModelError::decode("count", format!("`{s}`: {e}"))),
        other => Err(ModelError::decode(
            "count",
            format!("unexpected {} value", json_kind(other)),
        )),
    }
}

/// A [`ModelHandle`] whose rows are read into `T` and written from any
/// `Serialize` type.
///
/// `T` should use `#[serde(rename_all = "camelCase")]` so that its field names
/// match API casing.
pub struct TypedModel<T, P> {
    handle: ModelHandle<P>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, P> Clone for TypedModel<T, P> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, P> fmt::Debug for TypedModel<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedModel")
            .field("table", &self.handle.table)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: DeserializeOwned, P: ConnectionPool> TypedModel<T, P> {
    /// The untyped handle.
    pub fn handle(&self) -> &ModelHandle<P> {
        &self.handle
    }

    pub async fn find_many(&self, filter: &Filter) -> ModelResult<Vec<T>> {
        self.handle
            .find_many(filter)
            .await?
            .into_iter()
            .map(Record::into_typed)
            .collect()
    }

    pub async fn find_unique(&self, filter: &Filter) -> ModelResult<Option<T>> {
        self.handle
            .find_unique(filter)
            .await?
            .map(Record::into_typed)
            .transpose()
    }

    /// Insert `values` (any struct or map serializing to an object).
    pub async fn create<N: Serialize + ?Sized>(&self, values: &N) -> ModelResult<T> {
        let values = Record::from_typed(values)?;
        self.handle.create(&values).await?.into_typed()
    }

    pub async fn update<U: Serialize + ?Sized>(
        &self,
        filter: &Filter,
        values: &U,
    ) -> ModelResult<Option<T>> {
        let values = Record::from_typed(values)?;
        self.handle
            .update(filter, &values)
            .await?
            .map(Record::into_typed)
            .transpose()
    }

    pub async fn delete(&self, filter: &Filter) -> ModelResult<Deleted> {
        self.handle.delete(filter).await
    }

    pub async fn count(&self, filter: &Filter) -> ModelResult<i64> {
        self.handle.count(filter).await
    }
}
