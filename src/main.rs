//! sql-exercise: runs SQL course modules against a real database.

use anyhow::Context;
use sql_exercise_runner::catalog::Catalog;
use sql_exercise_runner::cli::{Cli, Command};
use sql_exercise_runner::config::{Config, ConnectionConfig};
use sql_exercise_runner::error::{ExerciseError, Result};
use sql_exercise_runner::logging;
use sql_exercise_runner::output::{self, OutputFormat};
use sql_exercise_runner::runner::{ExerciseRunner, RunnerOptions};
use tracing::{error, info};

fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    match &cli.log_file {
        Some(path) => {
            if let Err(e) = logging::init_file_logging(path) {
                eprintln!("{}: {}", e.category(), e);
                std::process::exit(1);
            }
        }
        None => logging::init_stderr_logging(),
    }

    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")
        .and_then(|runtime| runtime.block_on(run(cli)));

    if let Err(e) = outcome {
        match e.downcast_ref::<ExerciseError>() {
            Some(err) => error!("{}: {}", err.category(), err),
            None => error!("{e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;
    let format = cli.output_format()?;
    let catalog = load_catalog(&cli, &config)?;

    match &cli.command {
        Command::List => {
            println!("{}", output::render_catalog(&catalog, format)?);
            return Ok(());
        }
        Command::Show { module } => {
            println!("{}", output::render_module(catalog.module(module)?, format)?);
            return Ok(());
        }
        _ => {}
    }

    let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
        ExerciseError::config(
            "No database connection configured. Use --url, --database or a config file",
        )
    })?;

    let mut options = RunnerOptions::from(&config.runner);
    options.drop_existing |= cli.drop_existing;

    let runner = ExerciseRunner::open(&connection, catalog, options).await?;
    let result = execute(&runner, &cli.command, format).await;
    runner.close().await;

    println!("{}", result?);
    Ok(())
}

/// Runs one session command and renders what it produced.
async fn execute(
    runner: &ExerciseRunner,
    command: &Command,
    format: OutputFormat,
) -> Result<String> {
    match command {
        Command::Setup { module } => {
            runner.setup(module).await?;
            output::render_status(module, "schema created", None, format)
        }
        Command::Seed { module } => {
            let rows = runner.seed(module).await?;
            output::render_status(module, "seeded", Some(rows), format)
        }
        Command::Teardown { module } => {
            runner.teardown(module).await?;
            output::render_status(module, "schema dropped", None, format)
        }
        Command::Run {
            module,
            query: Some(query),
        } => {
            let outcome = runner.run(module, query).await?;
            output::render_outcome(query, &outcome, format)
        }
        Command::Run { module, query: None } => {
            let results = runner.run_all(module).await?;
            let rendered = results
                .iter()
                .map(|(name, outcome)| output::render_outcome(name, outcome, format))
                .collect::<Result<Vec<_>>>()?;
            Ok(rendered.join("\n\n"))
        }
        Command::Explain { module, query } => {
            let plan = runner.explain(module, query).await?;
            output::render_plan(query, &plan, format)
        }
        Command::Exercise { module } => {
            let report = runner.exercise(module).await?;
            output::render_report(&report, format)
        }
        Command::List | Command::Show { .. } => {
            Err(ExerciseError::internal("catalog commands do not open a session"))
        }
    }
}

/// Built-in modules plus any module directory from the CLI or config.
fn load_catalog(cli: &Cli, config: &Config) -> Result<Catalog> {
    let mut catalog = Catalog::builtin()?;
    if let Some(dir) = cli.modules_dir.as_ref().or(config.runner.modules_dir.as_ref()) {
        let added = catalog.load_dir(dir)?;
        info!("Loaded {added} modules from {}", dir.display());
    }
    Ok(catalog)
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Precedence:
    // 1. CLI URL or flags
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. DATABASE_URL
    let mut connection = cli.to_connection_config()?;

    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(ExerciseError::config(format!(
                    "Connection '{name}' not found in config file"
                )));
            }
        }
    }

    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    if connection.is_none() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            connection = Some(ConnectionConfig::from_connection_string(&url)?);
        }
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
        info!("Connection: {}", conn.display_string());
    }

    Ok(connection)
}
