//! Full module runs against live PostgreSQL and MySQL servers.
//!
//! These tests need a reachable server and are skipped otherwise:
//! `DATABASE_URL` for PostgreSQL and `MYSQL_DATABASE_URL` for MySQL. Each
//! module is torn down after its run because modules reuse table names.

use sql_exercise_runner::catalog::Catalog;
use sql_exercise_runner::config::ConnectionConfig;
use sql_exercise_runner::db::DatabaseBackend;
use sql_exercise_runner::runner::{ExerciseRunner, RunnerOptions};

use super::{outcome, rows};

async fn open(url: &str, backend: DatabaseBackend) -> ExerciseRunner {
    let config = ConnectionConfig::from_connection_string(url).unwrap();
    assert_eq!(config.backend, backend);
    let runner = ExerciseRunner::open(
        &config,
        Catalog::builtin().unwrap(),
        RunnerOptions {
            drop_existing: true,
        },
    )
    .await
    .unwrap();
    assert_eq!(runner.backend(), backend);
    runner
}

async fn exercise_and_drop(runner: &ExerciseRunner, module_id: &str) {
    let module = runner.catalog().module(module_id).unwrap();
    let declared: usize = module.declared_rows().unwrap().values().sum();
    let query_count = module.queries.len();

    let report = runner.exercise(module_id).await.unwrap();
    assert_eq!(report.seeded_rows, declared as u64, "{module_id}");
    assert_eq!(report.results.len(), query_count, "{module_id}");

    runner.teardown(module_id).await.unwrap();
}

#[tokio::test]
async fn test_postgres_modules() {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        }
    };
    let runner = open(&url, DatabaseBackend::Postgres).await;

    let report = runner.exercise("module_1_postgres").await.unwrap();
    let products = rows(outcome(&report.results, "products_in_category"));
    assert_eq!(products.row_count(), 2);
    let history = rows(outcome(&report.results, "account_transactions"));
    assert!(!history.is_empty());
    runner.teardown("module_1_postgres").await.unwrap();

    exercise_and_drop(&runner, "module_4_postgres").await;

    // Setting up twice goes through the drop-and-retry path
    runner.setup("module_4_postgres").await.unwrap();
    runner.setup("module_4_postgres").await.unwrap();
    runner.teardown("module_4_postgres").await.unwrap();

    runner.close().await;
}

#[tokio::test]
async fn test_mysql_modules() {
    let url = match std::env::var("MYSQL_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: MYSQL_DATABASE_URL not set");
            return;
        }
    };
    let runner = open(&url, DatabaseBackend::Mysql).await;

    for module in ["module_1", "module_2", "module_3", "module_4_mysql"] {
        exercise_and_drop(&runner, module).await;
    }

    runner.setup("module_3").await.unwrap();
    let plan = runner.explain("module_3", "orders_by_customer").await.unwrap();
    assert!(!plan.is_empty());
    runner.teardown("module_3").await.unwrap();

    runner.close().await;
}
