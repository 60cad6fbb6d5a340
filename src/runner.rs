//! The exercise runner.
//!
//! Drives one database session through a module variant: DDL, seed rows,
//! then the documented statements, one at a time and in declaration order.
//! Every failure is tagged with the statement that caused it.

use crate::catalog::{Catalog, Module, NamedStatement};
use crate::classify::{SqlClassifier, StatementKind};
use crate::config::{ConnectionConfig, RunnerConfig};
use crate::db::{self, DatabaseBackend, DatabaseClient, QueryResult, StatementOutcome};
use crate::error::{ExerciseError, Result, Section, StatementRef};
use tracing::{debug, info, warn};

/// Behaviour switches for a runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Drop the module's objects and retry once when `setup` hits an object
    /// that already exists.
    pub drop_existing: bool,
}

impl From<&RunnerConfig> for RunnerOptions {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            drop_existing: config.drop_existing,
        }
    }
}

/// Everything `exercise` produced for one module.
#[derive(Debug, Clone)]
pub struct ExerciseReport {
    pub module: String,
    /// Rows inserted by the seed section.
    pub seeded_rows: u64,
    /// Outcome of every documented statement, in order.
    pub results: Vec<(String, StatementOutcome)>,
}

/// Runs module variants against a single database session.
pub struct ExerciseRunner {
    client: Box<dyn DatabaseClient>,
    catalog: Catalog,
    options: RunnerOptions,
}

impl ExerciseRunner {
    /// Creates a runner over an already open client.
    pub fn new(client: Box<dyn DatabaseClient>, catalog: Catalog, options: RunnerOptions) -> Self {
        Self {
            client,
            catalog,
            options,
        }
    }

    /// Opens a session for `connection` and wraps it in a runner.
    pub async fn open(
        connection: &ConnectionConfig,
        catalog: Catalog,
        options: RunnerOptions,
    ) -> Result<Self> {
        info!("Connecting to {}", connection.display_string());
        let client = db::connect(connection).await?;
        Ok(Self::new(client, catalog, options))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> RunnerOptions {
        self.options
    }

    /// Backend of the underlying session.
    pub fn backend(&self) -> DatabaseBackend {
        self.client.backend()
    }

    /// Resolves a module and checks that the session speaks its dialect.
    fn module(&self, module_id: &str) -> Result<&Module> {
        let module = self.catalog.module(module_id)?;
        let backend = self.client.backend();
        if module.dialect.backend() != backend {
            return Err(ExerciseError::config(format!(
                "Module '{}' is written for {} but the connection is {}",
                module.id, module.dialect, backend
            )));
        }
        Ok(module)
    }

    /// Creates the module's schema objects.
    ///
    /// An object that already exists fails with a schema error unless
    /// `drop_existing` is set, in which case the module is torn down and the
    /// whole DDL list is applied once more.
    pub async fn setup(&self, module_id: &str) -> Result<()> {
        let module = self.module(module_id)?;
        info!("Setting up {} ({} statements)", module.id, module.ddl.len());

        match self.run_section(module, Section::Ddl, &module.ddl).await {
            Err(e) if e.is_already_exists() && self.options.drop_existing => {
                warn!("{e}; dropping existing objects and retrying");
                self.run_section(module, Section::Teardown, &module.teardown)
                    .await?;
                self.run_section(module, Section::Ddl, &module.ddl).await?;
            }
            other => {
                other?;
            }
        }

        info!("Schema for {} is in place", module.id);
        Ok(())
    }

    /// Inserts the module's seed rows. Returns the number of rows inserted.
    pub async fn seed(&self, module_id: &str) -> Result<u64> {
        let module = self.module(module_id)?;
        info!("Seeding {} ({} statements)", module.id, module.seed.len());
        let rows = self.run_section(module, Section::Seed, &module.seed).await?;
        info!("Seeded {rows} rows into {}", module.id);
        Ok(rows)
    }

    /// Drops every object the module creates, dependents first.
    pub async fn teardown(&self, module_id: &str) -> Result<()> {
        let module = self.module(module_id)?;
        info!("Tearing down {}", module.id);
        self.run_section(module, Section::Teardown, &module.teardown)
            .await?;
        Ok(())
    }

    /// Runs one documented statement.
    pub async fn run(&self, module_id: &str, query_name: &str) -> Result<StatementOutcome> {
        let module = self.module(module_id)?;
        let (index, query) = module.query(query_name)?;
        self.run_query(module, index, query).await
    }

    /// Runs every documented statement in order, stopping at the first
    /// failure.
    pub async fn run_all(&self, module_id: &str) -> Result<Vec<(String, StatementOutcome)>> {
        let module = self.module(module_id)?;
        info!("Running {} queries of {}", module.queries.len(), module.id);

        let mut results = Vec::with_capacity(module.queries.len());
        for (index, query) in module.queries.iter().enumerate() {
            let outcome = self.run_query(module, index, query).await?;
            results.push((query.name.clone(), outcome));
        }
        Ok(results)
    }

    /// Shows how the database would execute a documented statement.
    ///
    /// Statements that are already plan inspections run as written; other
    /// queries and data changes get the dialect's plan prefix. The plan is
    /// returned as the database reports it.
    pub async fn explain(&self, module_id: &str, query_name: &str) -> Result<QueryResult> {
        let module = self.module(module_id)?;
        let (index, query) = module.query(query_name)?;
        let at = StatementRef::new(&module.id, Section::Explain, index, &query.name);

        let kind = SqlClassifier::new(module.dialect).classify(&query.sql);
        let sql = match kind {
            StatementKind::Explain => query.sql.clone(),
            kind if kind.is_explainable() => format!(
                "{} {}",
                module.dialect.plan_prefix(),
                query.sql.trim().trim_end_matches(';')
            ),
            kind => {
                return Err(ExerciseError::catalog(format!(
                    "Query '{}' in module '{}' is a {kind} statement and has no plan",
                    query.name, module.id
                )));
            }
        };

        debug!("{at}: {sql}");
        let plan = self.client.fetch(&sql).await.map_err(|e| e.at(at))?;
        debug!("Plan has {} rows", plan.row_count());
        Ok(plan)
    }

    /// Sets up, seeds and runs a module in one go.
    pub async fn exercise(&self, module_id: &str) -> Result<ExerciseReport> {
        self.setup(module_id).await?;
        let seeded_rows = self.seed(module_id).await?;
        let results = self.run_all(module_id).await?;
        Ok(ExerciseReport {
            module: module_id.to_string(),
            seeded_rows,
            results,
        })
    }

    /// Releases the session's connection.
    pub async fn close(self) {
        self.client.close().await;
        debug!("Session closed");
    }

    /// Sends a DDL, teardown or seed section over the unprepared protocol.
    async fn run_section(
        &self,
        module: &Module,
        section: Section,
        statements: &[NamedStatement],
    ) -> Result<u64> {
        let mut affected = 0;
        for (index, statement) in statements.iter().enumerate() {
            let at = StatementRef::new(&module.id, section, index, &statement.name);
            debug!("{at}");
            affected += self
                .client
                .execute_script(&statement.sql)
                .await
                .map_err(|e| e.at(at))?;
        }
        Ok(affected)
    }

    async fn run_query(
        &self,
        module: &Module,
        index: usize,
        query: &NamedStatement,
    ) -> Result<StatementOutcome> {
        let at = StatementRef::new(&module.id, Section::Query, index, &query.name);
        let kind = SqlClassifier::new(module.dialect).classify(&query.sql);
        debug!("{at} [{kind}]");

        let outcome = match kind {
            k if k.returns_rows() => self
                .client
                .fetch(&query.sql)
                .await
                .map(StatementOutcome::Rows),
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete => self
                .client
                .execute(&query.sql)
                .await
                .map(StatementOutcome::Affected),
            // Definitions inside a lesson (ETL tables) take the same path as DDL.
            _ => self
                .client
                .execute_script(&query.sql)
                .await
                .map(StatementOutcome::Affected),
        }
        .map_err(|e| e.at(at))?;

        match &outcome {
            StatementOutcome::Rows(result) => {
                debug!("{} returned {} rows", query.name, result.row_count())
            }
            StatementOutcome::Affected(n) => debug!("{} affected {n} rows", query.name),
        }
        Ok(outcome)
    }
}
