//! Seed data lands in full on SQLite.

use sql_exercise_runner::catalog::{Catalog, Dialect};
use sql_exercise_runner::runner::RunnerOptions;

use super::{count_rows, sqlite_session};

#[tokio::test]
async fn test_every_sqlite_module_seeds_its_declared_rows() {
    let catalog = Catalog::builtin().unwrap();
    let modules: Vec<_> = catalog
        .modules()
        .iter()
        .filter(|m| m.dialect == Dialect::Sqlite)
        .collect();
    assert_eq!(modules.len(), 4);

    for module in modules {
        // Modules reuse table names, so each one gets a fresh database
        let (runner, client) = sqlite_session(RunnerOptions::default()).await;
        runner.setup(&module.id).await.unwrap();
        let seeded = runner.seed(&module.id).await.unwrap();

        let declared = module.declared_rows().unwrap();
        assert!(!declared.is_empty(), "{} seeds nothing", module.id);
        for (table, expected) in &declared {
            assert_eq!(
                count_rows(client.as_ref(), table).await,
                *expected as i64,
                "{}.{table}",
                module.id
            );
        }

        let total: usize = declared.values().sum();
        assert_eq!(seeded, total as u64, "{}", module.id);
    }
}

#[tokio::test]
async fn test_seed_reports_rows_inserted() {
    let (runner, _client) = sqlite_session(RunnerOptions::default()).await;
    runner.setup("module_2_sqlite").await.unwrap();
    assert_eq!(runner.seed("module_2_sqlite").await.unwrap(), 16);
}

#[tokio::test]
async fn test_seed_without_setup_is_missing_table() {
    let (runner, _client) = sqlite_session(RunnerOptions::default()).await;
    let err = runner.seed("module_4_sqlite").await.unwrap_err();
    assert_eq!(err.category(), "Schema Error");
    assert_eq!(err.statement().map(|at| at.index), Some(0));
}
