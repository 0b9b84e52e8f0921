//! Client and pool traits the executor runs statements through.
//!
//! [`GenericClient`] is implemented for `tokio_postgres::Client` and, with the
//! `pool` feature, for `deadpool_postgres::Client`. [`ConnectionPool`] hands out
//! one client per statement; dropping the client returns it to the pool.

use crate::error::{ModelError, ModelResult};
use crate::qb::ParamList;
use crate::record::Record;
use crate::row::decode_row;
use std::future::Future;

/// A connection that can run one parameterized statement.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows as storage-cased records.
    fn query(
        &self,
        sql: &str,
        params: &ParamList,
    ) -> impl Future<Output = ModelResult<Vec<Record>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &ParamList,
    ) -> impl Future<Output = ModelResult<u64>> + Send;
}

/// A source of pooled connections.
///
/// The returned connection is released when it is dropped.
pub trait ConnectionPool: Send + Sync {
    type Conn: GenericClient;

    /// Borrow one connection, waiting if none is free.
    fn acquire(&self) -> impl Future<Output = ModelResult<Self::Conn>> + Send;
}

async fn query_rows(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &ParamList,
) -> ModelResult<Vec<Record>> {
    let rows = client
        .query(sql, &params.as_refs())
        .await
        .map_err(ModelError::from_db_error)?;
    rows.iter().map(decode_row).collect()
}

async fn execute_statement(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &ParamList,
) -> ModelResult<u64> {
    client
        .execute(sql, &params.as_refs())
        .await
        .map_err(ModelError::from_db_error)
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &ParamList) -> ModelResult<Vec<Record>> {
        query_rows(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &ParamList) -> ModelResult<u64> {
        execute_statement(self, sql, params).await
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &ParamList) -> ModelResult<Vec<Record>> {
        // Deref chain: Object -> ClientWrapper -> tokio_postgres::Client.
        query_rows(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &ParamList) -> ModelResult<u64> {
        execute_statement(self, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl ConnectionPool for deadpool_postgres::Pool {
    type Conn = deadpool_postgres::Client;

    async fn acquire(&self) -> ModelResult<Self::Conn> {
        Ok(self.get().await?)
    }
}
