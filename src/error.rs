//! Error types for the exercise runner.
//!
//! Defines the main error enum used throughout the application. Errors raised
//! while executing a module statement carry a [`StatementRef`] so the caller
//! can tell which module, section and statement the database rejected.

use std::fmt;
use thiserror::Error;

/// Section of a module a statement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Ddl,
    Seed,
    Query,
    Teardown,
    Explain,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ddl => write!(f, "ddl"),
            Self::Seed => write!(f, "seed"),
            Self::Query => write!(f, "query"),
            Self::Teardown => write!(f, "teardown"),
            Self::Explain => write!(f, "explain"),
        }
    }
}

/// Identifies the statement an error originated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRef {
    /// Module variant id (e.g. `module_2`).
    pub module: String,
    /// Section of the module.
    pub section: Section,
    /// Zero-based position within the section.
    pub index: usize,
    /// Statement name as declared in the module file.
    pub name: String,
}

impl StatementRef {
    pub fn new(
        module: impl Into<String>,
        section: Section,
        index: usize,
        name: impl Into<String>,
    ) -> Self {
        Self {
            module: module.into(),
            section,
            index,
            name: name.into(),
        }
    }
}

impl fmt::Display for StatementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} #{} ({})",
            self.module, self.section, self.index, self.name
        )
    }
}

/// Which way a schema object lookup went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// CREATE hit an object that is already there.
    AlreadyExists,
    /// The statement referenced a table, view or routine that is not there.
    Missing,
}

/// Main error type for exercise runner operations.
#[derive(Error, Debug)]
pub enum ExerciseError {
    /// Schema object already exists or does not exist.
    #[error("Schema error at {at}: {message}")]
    Schema {
        at: StatementRef,
        kind: SchemaErrorKind,
        message: String,
    },

    /// Foreign key, uniqueness, not-null or check constraint violated.
    #[error("Constraint violation at {at}: {message}")]
    ConstraintViolation { at: StatementRef, message: String },

    /// The engine rejected the statement text.
    #[error("Syntax error at {at}: {message}")]
    Syntax { at: StatementRef, message: String },

    /// Any other engine error raised while executing a statement.
    #[error("Statement failed at {at}: {message}")]
    Statement { at: StatementRef, message: String },

    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration errors (invalid config file, dialect mismatch, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown module or query, malformed module file.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExerciseError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a catalog error with the given message.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "Schema Error",
            Self::ConstraintViolation { .. } => "Constraint Violation",
            Self::Syntax { .. } => "Syntax Error",
            Self::Statement { .. } => "Statement Error",
            Self::Connection(_) => "Connection Error",
            Self::Config(_) => "Configuration Error",
            Self::Catalog(_) => "Catalog Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the originating statement, if the error came from one.
    pub fn statement(&self) -> Option<&StatementRef> {
        match self {
            Self::Schema { at, .. }
            | Self::ConstraintViolation { at, .. }
            | Self::Syntax { at, .. }
            | Self::Statement { at, .. } => Some(at),
            _ => None,
        }
    }

    /// Returns true for a schema error caused by an object that already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Self::Schema {
                kind: SchemaErrorKind::AlreadyExists,
                ..
            }
        )
    }
}

/// Result type alias using ExerciseError.
pub type Result<T> = std::result::Result<T, ExerciseError>;
