//! Statement classification.
//!
//! Parses SQL with the module's dialect to decide whether a statement hands
//! back a result set or an affected-row count, and to count the `VALUES`
//! tuples in seed inserts. The parsed tree is only inspected; the database
//! always receives the statement text as written.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use std::fmt;

/// The type of SQL statement detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// SELECT, WITH, VALUES, SHOW, PRAGMA, DESCRIBE.
    Query,
    /// Plan inspection.
    Explain,
    /// Stored procedure call.
    Call,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    /// Anything else (transaction control, SET, GRANT, ...).
    Other,
}

impl StatementKind {
    /// Returns true if executing the statement yields a result set.
    pub fn returns_rows(&self) -> bool {
        matches!(self, Self::Query | Self::Explain | Self::Call)
    }

    /// Returns true if the statement can be wrapped in a plan inspection.
    pub fn is_explainable(&self) -> bool {
        matches!(
            self,
            Self::Query | Self::Insert | Self::Update | Self::Delete
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "SELECT"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Call => write!(f, "CALL"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Create => write!(f, "CREATE"),
            Self::Drop => write!(f, "DROP"),
            Self::Alter => write!(f, "ALTER"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// Tuples inserted by one seed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedRows {
    /// Target table, unquoted.
    pub table: String,
    /// Number of `VALUES` tuples.
    pub rows: usize,
}
