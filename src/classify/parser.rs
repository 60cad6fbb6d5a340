//! SQL parsing and classification logic.
//!
//! Uses sqlparser-rs with the module's dialect. Text the parser does not
//! understand (procedure bodies, vendor extensions) falls back to the
//! leading keyword, so classification never blocks a statement the
//! database itself would accept.

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::{Dialect as ParserDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use crate::catalog::Dialect;

use super::{InsertedRows, StatementKind};

/// SQL classifier for one dialect.
#[derive(Debug, Clone, Copy)]
pub struct SqlClassifier {
    dialect: Dialect,
}

impl SqlClassifier {
    /// Creates a classifier for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    fn parser_dialect(&self) -> Box<dyn ParserDialect> {
        match self.dialect {
            Dialect::Mysql => Box::new(MySqlDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    fn parse(&self, sql: &str) -> Option<Vec<Statement>> {
        let dialect = self.parser_dialect();
        Parser::parse_sql(dialect.as_ref(), sql).ok()
    }

    /// Classifies a single statement.
    pub fn classify(&self, sql: &str) -> StatementKind {
        match self.parse(sql).as_deref() {
            Some([statement]) => classify_statement(statement),
            _ => classify_keyword(sql),
        }
    }

    /// Counts the `VALUES` tuples of an INSERT.
    ///
    /// Returns `None` for anything that is not a single `INSERT ... VALUES`
    /// (e.g. `INSERT ... SELECT`, or text the parser rejects).
    pub fn inserted_rows(&self, sql: &str) -> Option<InsertedRows> {
        let statements = self.parse(sql)?;
        let [Statement::Insert(insert)] = statements.as_slice() else {
            return None;
        };
        let source = insert.source.as_ref()?;
        let SetExpr::Values(values) = source.body.as_ref() else {
            return None;
        };
        let table = insert.table_name.0.last()?.value.clone();
        Some(InsertedRows {
            table,
            rows: values.rows.len(),
        })
    }
}

/// Convenience function to classify SQL without creating a classifier instance.
pub fn classify_sql(sql: &str, dialect: Dialect) -> StatementKind {
    SqlClassifier::new(dialect).classify(sql)
}

/// Classifies a single parsed statement.
fn classify_statement(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain { .. } | Statement::ExplainTable { .. } => StatementKind::Explain,
        Statement::Call(_) => StatementKind::Call,
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. }
        | Statement::Pragma { .. } => StatementKind::Query,

        Statement::Insert(_) => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete(_) => StatementKind::Delete,

        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateProcedure { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateSequence { .. }
        | Statement::CreateType { .. } => StatementKind::Create,
        Statement::Drop { .. } | Statement::DropFunction { .. } => StatementKind::Drop,
        Statement::AlterTable { .. } | Statement::AlterIndex { .. } | Statement::AlterView { .. } => {
            StatementKind::Alter
        }

        _ => StatementKind::Other,
    }
}

/// A query whose body is a data-modifying statement (PostgreSQL allows
/// `WITH ... UPDATE`) reports affected rows, not a result set.
fn classify_query(query: &Query) -> StatementKind {
    match query.body.as_ref() {
        SetExpr::Insert(_) => StatementKind::Insert,
        SetExpr::Update(_) => StatementKind::Update,
        SetExpr::Query(inner) => classify_query(inner),
        _ => StatementKind::Query,
    }
}

/// Classifies by the first keyword, skipping `--` comment lines.
fn classify_keyword(sql: &str) -> StatementKind {
    let first = sql
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("--"))
        .flat_map(str::split_whitespace)
        .next()
        .map(|word| word.trim_start_matches('(').to_uppercase())
        .unwrap_or_default();

    match first.as_str() {
        "SELECT" | "WITH" | "VALUES" | "SHOW" | "PRAGMA" | "DESCRIBE" | "DESC" | "TABLE" => {
            StatementKind::Query
        }
        "EXPLAIN" => StatementKind::Explain,
        "CALL" | "EXEC" | "EXECUTE" => StatementKind::Call,
        "INSERT" | "REPLACE" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        "CREATE" => StatementKind::Create,
        "DROP" => StatementKind::Drop,
        "ALTER" => StatementKind::Alter,
        _ => StatementKind::Other,
    }
}
