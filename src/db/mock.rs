//! Recording database client for testing.
//!
//! Accepts every statement, remembers what it was sent, and fails on
//! statements that match an injected failure rule.

use super::{
    ColumnInfo, DatabaseBackend, DatabaseClient, DbError, DbErrorKind, DbResult, QueryResult,
    Value,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// Which client method received a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Script,
    Fetch,
    Execute,
}

struct FailureRule {
    needle: String,
    error: DbError,
    remaining: usize,
}

/// A client that records statements instead of running them.
pub struct RecordingClient {
    backend: DatabaseBackend,
    calls: Mutex<Vec<(CallKind, String)>>,
    failures: Mutex<Vec<FailureRule>>,
    closed: Mutex<bool>,
}

impl RecordingClient {
    /// Creates a recording client that claims to be the given backend.
    pub fn new(backend: DatabaseBackend) -> Self {
        Self {
            backend,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        }
    }

    /// Fails the next `times` statements containing `needle` with `error`.
    pub fn fail_on(self, needle: impl Into<String>, error: DbError, times: usize) -> Self {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(FailureRule {
                needle: needle.into(),
                error,
                remaining: times,
            });
        }
        self
    }

    /// All statements received so far, in order.
    pub fn calls(&self) -> Vec<(CallKind, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Statement texts received so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, sql)| sql).collect()
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.lock().map(|c| *c).unwrap_or(false)
    }

    fn record(&self, kind: CallKind, sql: &str) -> DbResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((kind, sql.to_string()));
        }

        let mut failures = self
            .failures
            .lock()
            .map_err(|_| DbError::new(DbErrorKind::Other, "failure rules poisoned"))?;
        if let Some(rule) = failures
            .iter_mut()
            .find(|rule| rule.remaining > 0 && sql.contains(&rule.needle))
        {
            rule.remaining -= 1;
            return Err(rule.error.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseClient for RecordingClient {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn execute_script(&self, sql: &str) -> DbResult<u64> {
        self.record(CallKind::Script, sql)?;
        Ok(0)
    }

    async fn fetch(&self, sql: &str) -> DbResult<QueryResult> {
        self.record(CallKind::Fetch, sql)?;
        Ok(QueryResult::with_data(
            vec![ColumnInfo::new("statement", "text")],
            vec![vec![Value::from(sql)]],
        ))
    }

    async fn execute(&self, sql: &str) -> DbResult<u64> {
        self.record(CallKind::Execute, sql)?;
        Ok(1)
    }

    async fn close(&self) {
        if let Ok(mut closed) = self.closed.lock() {
            *closed = true;
        }
    }
}
