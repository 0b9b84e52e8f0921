//! Statement executor: one pooled connection per statement.
//!
//! Every call follows acquire → run → release. The connection is owned by a
//! local that goes out of scope before the monitor is told about the outcome
//! and before the result is returned, so it is back in the pool on every exit
//! path, including statement and acquisition failures.

use crate::client::{ConnectionPool, GenericClient};
use crate::error::{ModelError, ModelResult};
use crate::monitor::{NoopMonitor, QueryContext, QueryMonitor, QueryResult};
use crate::qb::BuiltQuery;
use crate::record::Record;
use std::sync::Arc;
use std::time::{Duration, Instant};

enum Statement {
    Query,
    Execute,
}

enum Outcome {
    Rows(Vec<Record>),
    Affected(u64),
}

/// Runs built queries against a connection pool and reports each to a monitor.
pub struct StatementExecutor<P> {
    pool: P,
    monitor: Arc<dyn QueryMonitor>,
}

impl<P: ConnectionPool> StatementExecutor<P> {
    /// Create an executor with no monitoring.
    pub fn new(pool: P) -> Self {
        Self {
            pool,
            monitor: Arc::new(NoopMonitor),
        }
    }

    /// Replace the monitor.
    pub fn with_monitor<M: QueryMonitor + 'static>(self, monitor: M) -> Self {
        self.with_monitor_arc(Arc::new(monitor))
    }

    /// Replace the monitor with a shared one.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// The underlying pool.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Run a row-returning statement and collect every row.
    pub async fn fetch_all(&self, query: &BuiltQuery) -> ModelResult<Vec<Record>> {
        match self.run(query, Statement::Query).await? {
            Outcome::Rows(rows) => Ok(rows),
            Outcome::Affected(_) => Ok(Vec::new()),
        }
    }

    /// Run a row-returning statement and keep the first row, if any.
    pub async fn fetch_opt(&self, query: &BuiltQuery) -> ModelResult<Option<Record>> {
        Ok(self.fetch_all(query).await?.into_iter().next())
    }

    /// Run a row-returning statement that must produce a row.
    pub async fn fetch_one(&self, query: &BuiltQuery) -> ModelResult<Record> {
        self.fetch_opt(query).await?.ok_or_else(|| {
            ModelError::NotFound(format!(
                "{} on \"{}\" returned no rows",
                query.verb, query.table
            ))
        })
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(&self, query: &BuiltQuery) -> ModelResult<u64> {
        match self.run(query, Statement::Execute).await? {
            Outcome::Affected(n) => Ok(n),
            Outcome::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    async fn run(&self, query: &BuiltQuery, statement: Statement) -> ModelResult<Outcome> {
        let start = Instant::now();
        let outcome = match self.pool.acquire().await {
            Ok(conn) => match statement {
                Statement::Query => conn.query(&query.sql, &query.params).await.map(Outcome::Rows),
                Statement::Execute => conn
                    .execute(&query.sql, &query.params)
                    .await
                    .map(Outcome::Affected),
            },
            Err(err) => Err(err),
        };
        // `conn` has been dropped here; the connection is back in the pool.
        self.report(query, start.elapsed(), &outcome);
        outcome
    }

    fn report(&self, query: &BuiltQuery, duration: Duration, outcome: &ModelResult<Outcome>) {
        let result = match outcome {
            Ok(Outcome::Rows(rows)) => QueryResult::Rows(rows.len()),
            Ok(Outcome::Affected(n)) => QueryResult::Affected(*n),
            Err(err) => QueryResult::error(err.to_string()),
        };

        tracing::debug!(
            target: "pgmodel.sql",
            verb = %query.verb,
            table = %query.table,
            param_count = query.params.len(),
            duration_us = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX),
            ok = !result.is_error(),
            "statement complete"
        );

        self.monitor
            .on_query_complete(&QueryContext::new(query), duration, &result);
    }
}

impl<P> std::fmt::Debug for StatementExecutor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementExecutor").finish_non_exhaustive()
    }
}
