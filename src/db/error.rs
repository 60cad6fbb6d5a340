//! Classification of driver errors.
//!
//! Clients return a [`DbError`] without knowing which module statement they
//! ran; the runner attaches the [`StatementRef`] when it converts the error.

use crate::config::ConnectionConfig;
use crate::error::{ExerciseError, SchemaErrorKind, StatementRef};
use sqlx::error::ErrorKind;

/// Coarse kind of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    AlreadyExists,
    Missing,
    Constraint,
    Syntax,
    Connection,
    Other,
}

/// A failed statement, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbError {
    pub kind: DbErrorKind,
    pub message: String,
}

impl DbError {
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Attaches the originating statement and converts to the public error.
    pub fn at(self, at: StatementRef) -> ExerciseError {
        let message = self.message;
        match self.kind {
            DbErrorKind::AlreadyExists => ExerciseError::Schema {
                at,
                kind: SchemaErrorKind::AlreadyExists,
                message,
            },
            DbErrorKind::Missing => ExerciseError::Schema {
                at,
                kind: SchemaErrorKind::Missing,
                message,
            },
            DbErrorKind::Constraint => ExerciseError::ConstraintViolation { at, message },
            DbErrorKind::Syntax => ExerciseError::Syntax { at, message },
            DbErrorKind::Connection => ExerciseError::Connection(format!("{at}: {message}")),
            DbErrorKind::Other => ExerciseError::Statement { at, message },
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        let kind = classify(&error);
        let message = match error.as_database_error() {
            Some(db_error) => db_error.message().to_string(),
            None => error.to_string(),
        };
        Self { kind, message }
    }
}

/// Maps sqlx connection errors to user-friendly messages.
pub fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ExerciseError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config
        .effective_port()
        .map(|p| p.to_string())
        .unwrap_or_default();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ExerciseError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
        || error_str.contains("access denied")
    {
        ExerciseError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if (error_str.contains("does not exist") || error_str.contains("unknown database"))
        && error_str.contains("database")
    {
        ExerciseError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("unable to open database file") {
        ExerciseError::connection(format!("Cannot open SQLite database '{database}'."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ExerciseError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ExerciseError::connection(error.to_string())
    }
}

/// Maps a sqlx error onto a [`DbErrorKind`].
///
/// Uses the driver's constraint kind first, then the SQLSTATE code, then the
/// message text (SQLite reports most schema and syntax problems as a plain
/// `SQLITE_ERROR` with no finer code).
pub fn classify(error: &sqlx::Error) -> DbErrorKind {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => return DbErrorKind::Connection,
        _ => {}
    }

    let Some(db_error) = error.as_database_error() else {
        return DbErrorKind::Other;
    };

    match db_error.kind() {
        ErrorKind::UniqueViolation
        | ErrorKind::ForeignKeyViolation
        | ErrorKind::NotNullViolation
        | ErrorKind::CheckViolation => return DbErrorKind::Constraint,
        _ => {}
    }

    if let Some(code) = db_error.code() {
        if let Some(kind) = classify_sqlstate(&code) {
            return kind;
        }
    }

    classify_message(db_error.message())
}

/// SQLSTATE codes shared by PostgreSQL and MySQL.
fn classify_sqlstate(code: &str) -> Option<DbErrorKind> {
    match code {
        // duplicate_table, duplicate_object, duplicate_function, duplicate_schema
        "42P07" | "42710" | "42723" | "42P06" | "42S01" => Some(DbErrorKind::AlreadyExists),
        // undefined_table, undefined_object, undefined_function, undefined_column
        "42P01" | "42704" | "42883" | "42703" | "42S02" | "42S22" => Some(DbErrorKind::Missing),
        "42601" | "42000" => Some(DbErrorKind::Syntax),
        _ if code.starts_with("23") => Some(DbErrorKind::Constraint),
        _ if code.starts_with("08") => Some(DbErrorKind::Connection),
        _ => None,
    }
}

fn classify_message(message: &str) -> DbErrorKind {
    let msg = message.to_lowercase();

    if msg.contains("already exists") {
        DbErrorKind::AlreadyExists
    } else if msg.contains("no such table")
        || msg.contains("no such view")
        || msg.contains("no such index")
        || msg.contains("no such column")
        || msg.contains("does not exist")
        || msg.contains("doesn't exist")
    {
        DbErrorKind::Missing
    } else if msg.contains("constraint failed") || msg.contains("constraint violation") {
        DbErrorKind::Constraint
    } else if msg.contains("syntax error") || msg.contains("incomplete input") {
        DbErrorKind::Syntax
    } else {
        DbErrorKind::Other
    }
}
