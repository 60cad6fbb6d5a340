//! Schema setup, teardown and error reporting against SQLite.

use std::sync::Arc;

use sql_exercise_runner::catalog::{Catalog, Module};
use sql_exercise_runner::config::ConnectionConfig;
use sql_exercise_runner::db::{DatabaseClient, SqliteClient};
use sql_exercise_runner::error::{ExerciseError, SchemaErrorKind, Section, StatementRef};
use sql_exercise_runner::runner::{ExerciseRunner, RunnerOptions};

use super::{count_rows, runner_over, sqlite_session};

const ORPHANS: &str = r#"
id = "orphans"
title = "Orphaned rows"
dialect = "sqlite"

[[ddl]]
name = "create_parents"
sql = "CREATE TABLE Parents (ParentID INTEGER PRIMARY KEY)"

[[ddl]]
name = "create_children"
sql = "CREATE TABLE Children (ChildID INTEGER PRIMARY KEY, ParentID INTEGER NOT NULL REFERENCES Parents(ParentID))"

[[teardown]]
name = "drop_children"
sql = "DROP TABLE IF EXISTS Children"

[[teardown]]
name = "drop_parents"
sql = "DROP TABLE IF EXISTS Parents"

[[seed]]
name = "seed_parents"
sql = "INSERT INTO Parents (ParentID) VALUES (1)"

[[seed]]
name = "seed_children"
sql = "INSERT INTO Children (ChildID, ParentID) VALUES (1, 1), (2, 99)"
"#;

#[tokio::test]
async fn test_setup_twice_without_drop_is_schema_error() {
    let (runner, _client) = sqlite_session(RunnerOptions::default()).await;
    runner.setup("module_1_sqlite").await.unwrap();

    let err = runner.setup("module_1_sqlite").await.unwrap_err();
    match err {
        ExerciseError::Schema { at, kind, message } => {
            assert_eq!(kind, SchemaErrorKind::AlreadyExists);
            assert_eq!(
                at,
                StatementRef::new("module_1_sqlite", Section::Ddl, 0, "create_categories")
            );
            assert!(message.contains("already exists"), "{message}");
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_setup_with_drop_existing_recreates_empty_schema() {
    let (runner, client) = sqlite_session(RunnerOptions::default()).await;
    runner.setup("module_1_sqlite").await.unwrap();
    runner.seed("module_1_sqlite").await.unwrap();
    assert_eq!(count_rows(client.as_ref(), "Products").await, 5);

    let dropping = runner_over(&client, RunnerOptions { drop_existing: true });
    dropping.setup("module_1_sqlite").await.unwrap();

    for table in ["Categories", "Products", "Customers", "Accounts", "Transactions"] {
        assert_eq!(count_rows(client.as_ref(), table).await, 0, "{table}");
    }
    // The view and indexes came back too
    let objects = client
        .fetch(
            "SELECT name FROM sqlite_master \
             WHERE name IN ('ProductCatalog', 'idx_products_category') ORDER BY name",
        )
        .await
        .unwrap();
    assert_eq!(objects.row_count(), 2);
}

#[tokio::test]
async fn test_teardown_removes_every_object() {
    let (runner, client) = sqlite_session(RunnerOptions::default()).await;
    runner.setup("module_3_sqlite").await.unwrap();
    runner.seed("module_3_sqlite").await.unwrap();
    runner.teardown("module_3_sqlite").await.unwrap();

    let left = client
        .fetch("SELECT name FROM sqlite_master WHERE name NOT LIKE 'sqlite_%'")
        .await
        .unwrap();
    assert!(left.is_empty(), "left behind: {:?}", left.rows);

    // Teardown of a module that is not there is a no-op
    runner.teardown("module_3_sqlite").await.unwrap();
}

#[tokio::test]
async fn test_dangling_foreign_key_is_constraint_violation() {
    let client = Arc::new(
        SqliteClient::connect(&ConnectionConfig::sqlite_memory())
            .await
            .unwrap(),
    );
    let mut catalog = Catalog::builtin().unwrap();
    catalog
        .add(Module::from_toml(ORPHANS, "orphans.toml").unwrap())
        .unwrap();
    let runner = ExerciseRunner::new(
        Box::new(Arc::clone(&client)),
        catalog,
        RunnerOptions::default(),
    );

    runner.setup("orphans").await.unwrap();
    let err = runner.seed("orphans").await.unwrap_err();
    match &err {
        ExerciseError::ConstraintViolation { at, message } => {
            assert_eq!(*at, StatementRef::new("orphans", Section::Seed, 1, "seed_children"));
            assert!(message.contains("FOREIGN KEY"), "{message}");
        }
        other => panic!("expected constraint violation, got {other:?}"),
    }
    assert_eq!(err.category(), "Constraint Violation");
    // The failing insert is a single statement, so none of its rows landed
    assert_eq!(count_rows(client.as_ref(), "Children").await, 0);
}

#[tokio::test]
async fn test_seeding_twice_violates_primary_key() {
    let (runner, _client) = sqlite_session(RunnerOptions::default()).await;
    runner.setup("module_2_sqlite").await.unwrap();
    runner.seed("module_2_sqlite").await.unwrap();

    let err = runner.seed("module_2_sqlite").await.unwrap_err();
    assert!(matches!(err, ExerciseError::ConstraintViolation { .. }), "{err:?}");
    assert_eq!(
        err.statement(),
        Some(&StatementRef::new("module_2_sqlite", Section::Seed, 0, "seed_departments"))
    );
}

#[tokio::test]
async fn test_query_before_setup_is_missing_object() {
    let (runner, _client) = sqlite_session(RunnerOptions::default()).await;
    let err = runner
        .run("module_1_sqlite", "products_in_category")
        .await
        .unwrap_err();
    match err {
        ExerciseError::Schema { kind, at, .. } => {
            assert_eq!(kind, SchemaErrorKind::Missing);
            assert_eq!(at.section, Section::Query);
            assert_eq!(at.name, "products_in_category");
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dialect_mismatch_fails_before_sending() {
    let (runner, client) = sqlite_session(RunnerOptions::default()).await;
    let err = runner.setup("module_1").await.unwrap_err();
    assert!(matches!(err, ExerciseError::Config(_)), "{err:?}");

    let tables = client
        .fetch("SELECT name FROM sqlite_master")
        .await
        .unwrap();
    assert!(tables.is_empty());
}
