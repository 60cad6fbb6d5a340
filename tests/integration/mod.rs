//! Shared helpers for the integration tests.

pub mod lesson_test;
pub mod seed_test;
pub mod server_test;
pub mod setup_test;

use std::sync::Arc;

use sql_exercise_runner::catalog::Catalog;
use sql_exercise_runner::config::ConnectionConfig;
use sql_exercise_runner::db::{DatabaseClient, QueryResult, SqliteClient, StatementOutcome};
use sql_exercise_runner::runner::{ExerciseRunner, RunnerOptions};

/// An in-memory SQLite session plus a runner over it.
///
/// The returned client shares the runner's connection, so tests can inspect
/// what the runner left behind.
pub async fn sqlite_session(options: RunnerOptions) -> (ExerciseRunner, Arc<SqliteClient>) {
    let client = Arc::new(
        SqliteClient::connect(&ConnectionConfig::sqlite_memory())
            .await
            .unwrap(),
    );
    let runner = runner_over(&client, options);
    (runner, client)
}

/// A second runner over an existing session.
pub fn runner_over(client: &Arc<SqliteClient>, options: RunnerOptions) -> ExerciseRunner {
    ExerciseRunner::new(
        Box::new(Arc::clone(client)),
        Catalog::builtin().unwrap(),
        options,
    )
}

/// Number of rows currently in `table`.
pub async fn count_rows(client: &dyn DatabaseClient, table: &str) -> i64 {
    let result = client
        .fetch(&format!("SELECT COUNT(*) AS n FROM {table}"))
        .await
        .unwrap();
    result.rows[0][0].as_i64().unwrap()
}

/// Looks up one outcome of a `run_all` by query name.
pub fn outcome<'a>(results: &'a [(String, StatementOutcome)], name: &str) -> &'a StatementOutcome {
    results
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, outcome)| outcome)
        .unwrap_or_else(|| panic!("no result for {name}"))
}

/// The result set of a row-returning outcome.
pub fn rows(outcome: &StatementOutcome) -> &QueryResult {
    outcome
        .rows()
        .unwrap_or_else(|| panic!("expected rows, got {outcome:?}"))
}
