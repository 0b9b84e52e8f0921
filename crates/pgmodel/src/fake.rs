//! In-memory pool used by unit tests.
//!
//! `FakePool` hands out connections that replay scripted results in order and
//! record every statement they see. Each live connection is counted in
//! `outstanding` until it is dropped.

use crate::client::{ConnectionPool, GenericClient};
use crate::error::{ModelError, ModelResult};
use crate::qb::ParamList;
use crate::record::Record;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted statement outcome.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Rows(Vec<Record>),
    Affected(u64),
    Fail(String),
}

impl Script {
    /// Rows as the database would return them (storage-cased objects).
    pub(crate) fn rows(rows: Vec<Value>) -> Self {
        Script::Rows(
            rows.into_iter()
                .map(|row| Record::from_json(row).unwrap())
                .collect(),
        )
    }

    pub(crate) fn affected(n: u64) -> Self {
        Script::Affected(n)
    }

    pub(crate) fn fail(message: &str) -> Self {
        Script::Fail(message.to_string())
    }
}

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    acquired: AtomicUsize,
    scripts: Mutex<VecDeque<Script>>,
    acquire_error: Mutex<Option<String>>,
    statements: Mutex<Vec<(String, Value)>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePool {
    inner: Arc<Inner>,
}

impl FakePool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next statement. Unscripted statements return
    /// no rows and affect nothing.
    pub(crate) fn script(&self, script: Script) {
        self.inner.scripts.lock().unwrap().push_back(script);
    }

    /// Make every acquisition fail.
    pub(crate) fn fail_acquire(&self, message: &str) {
        *self.inner.acquire_error.lock().unwrap() = Some(message.to_string());
    }

    /// Connections currently checked out.
    pub(crate) fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    /// Successful acquisitions so far.
    pub(crate) fn acquired(&self) -> usize {
        self.inner.acquired.load(Ordering::SeqCst)
    }

    /// `(sql, params)` of every statement run so far.
    pub(crate) fn statements(&self) -> Vec<(String, Value)> {
        self.inner.statements.lock().unwrap().clone()
    }

    /// SQL of the most recent statement.
    pub(crate) fn last_sql(&self) -> Option<String> {
        self.statements().last().map(|(sql, _)| sql.clone())
    }
}

pub(crate) struct FakeConn {
    inner: Arc<Inner>,
}

impl FakeConn {
    fn next(&self, sql: &str, params: &ParamList) -> Option<Script> {
        self.inner
            .statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_json()));
        self.inner.scripts.lock().unwrap().pop_front()
    }
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        self.inner.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

impl GenericClient for FakeConn {
    async fn query(&self, sql: &str, params: &ParamList) -> ModelResult<Vec<Record>> {
        tokio::task::yield_now().await;
        match self.next(sql, params) {
            Some(Script::Rows(rows)) => Ok(rows),
            Some(Script::Fail(message)) => Err(ModelError::Connection(message)),
            Some(Script::Affected(_)) | None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, sql: &str, params: &ParamList) -> ModelResult<u64> {
        tokio::task::yield_now().await;
        match self.next(sql, params) {
            Some(Script::Affected(n)) => Ok(n),
            Some(Script::Rows(rows)) => Ok(rows.len() as u64),
            Some(Script::Fail(message)) => Err(ModelError::Connection(message)),
            None => Ok(0),
        }
    }
}

impl ConnectionPool for FakePool {
    type Conn = FakeConn;

    async fn acquire(&self) -> ModelResult<FakeConn> {
        if let Some(message) = self.inner.acquire_error.lock().unwrap().clone() {
            return Err(ModelError::Connection(message));
        }
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
        self.inner.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(FakeConn {
            inner: self.inner.clone(),
        })
    }
}
