//! Database abstraction layer for the exercise runner.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably. Each client holds
//! exactly one session: its pool is capped at a single connection that is
//! never reaped while idle, so session state (and SQLite `:memory:`
//! databases) lasts until the client is closed or dropped.

mod error;
mod mock;
mod mysql;
mod postgres;
mod sqlite;
mod types;

pub use error::{classify, map_connection_error, DbError, DbErrorKind};
pub use mock::{CallKind, RecordingClient};
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Record, Row, StatementOutcome, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Result type for client operations, before a statement reference is attached.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    Postgres,
    Mysql,
}

impl DatabaseBackend {
    /// Returns the backend as a string for display and config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::Mysql),
            _ => None,
        }
    }

    /// Returns the default port for this backend (none for SQLite).
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Sqlite => None,
            Self::Postgres => Some(5432),
            Self::Mysql => Some(3306),
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates a database client for the given backend and configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Sqlite => Ok(Box::new(SqliteClient::connect(config).await?)),
        DatabaseBackend::Postgres => Ok(Box::new(PostgresClient::connect(config).await?)),
        DatabaseBackend::Mysql => Ok(Box::new(MySqlClient::connect(config).await?)),
    }
}

/// Trait defining the interface for database clients.
///
/// Statements are sent exactly as written; clients never rewrite SQL.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Which backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Sends SQL text over the unprepared protocol and returns the number of
    /// affected rows. Used for DDL (procedure bodies included) and seed data.
    async fn execute_script(&self, sql: &str) -> DbResult<u64>;

    /// Executes a row-returning statement and collects the result set.
    async fn fetch(&self, sql: &str) -> DbResult<QueryResult>;

    /// Executes a statement that returns no rows and reports affected rows.
    async fn execute(&self, sql: &str) -> DbResult<u64>;

    /// Closes the session's connection.
    async fn close(&self);
}

#[async_trait]
impl<C: DatabaseClient + ?Sized> DatabaseClient for Arc<C> {
    fn backend(&self) -> DatabaseBackend {
        (**self).backend()
    }

    async fn execute_script(&self, sql: &str) -> DbResult<u64> {
        (**self).execute_script(sql).await
    }

    async fn fetch(&self, sql: &str) -> DbResult<QueryResult> {
        (**self).fetch(sql).await
    }

    async fn execute(&self, sql: &str) -> DbResult<u64> {
        (**self).execute(sql).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}
