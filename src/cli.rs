//! Command-line argument parsing for the exercise runner.
//!
//! Connection and output flags are global so they can follow any
//! subcommand.

use crate::config::{Config, ConnectionConfig};
use crate::db::DatabaseBackend;
use crate::error::{ExerciseError, Result};
use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Runs SQL course modules against a real database.
#[derive(Parser, Debug)]
#[command(name = "sql-exercise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connection URL (postgres://, mysql:// or sqlite:)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Database backend when connecting with individual flags
    #[arg(short = 'b', long, global = true, value_name = "BACKEND")]
    pub backend: Option<String>,

    /// Database host
    #[arg(short = 'H', long, global = true, value_name = "HOST")]
    pub host: Option<String>,

    /// Database port (defaults to the backend's standard port)
    #[arg(short = 'p', long, global = true, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database name, or file path for SQLite
    #[arg(short = 'd', long, global = true, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Database user
    #[arg(short = 'U', long, global = true, value_name = "USER")]
    pub user: Option<String>,

    /// Use named connection from config
    #[arg(short = 'c', long, global = true, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Drop and recreate a module's objects if setup finds them present
    #[arg(long, global = true)]
    pub drop_existing: bool,

    /// Directory of extra module files
    #[arg(long, global = true, value_name = "DIR")]
    pub modules_dir: Option<PathBuf>,

    /// Output format: text or json
    #[arg(long, global = true, value_name = "FORMAT", default_value = "text")]
    pub format: String,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the available module variants
    List,

    /// Print a module's statements
    Show { module: String },

    /// Create a module's schema objects
    Setup { module: String },

    /// Insert a module's seed rows
    Seed { module: String },

    /// Drop a module's schema objects
    Teardown { module: String },

    /// Run one documented query, or all of them in order
    Run {
        module: String,
        /// Query name; omit to run every query
        query: Option<String>,
    },

    /// Show the query plan for a documented query
    Explain { module: String, query: String },

    /// Set up, seed and run a module in one session
    Exercise { module: String },
}

impl Command {
    /// Returns true if the command needs a database session.
    pub fn needs_connection(&self) -> bool {
        !matches!(self, Self::List | Self::Show { .. })
    }
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Converts CLI arguments to a ConnectionConfig.
    ///
    /// This creates a config from CLI args only, without merging with file config.
    pub fn to_connection_config(&self) -> Result<Option<ConnectionConfig>> {
        // A URL wins over individual flags
        if let Some(url) = &self.url {
            return Ok(Some(ConnectionConfig::from_connection_string(url)?));
        }

        if self.backend.is_none()
            && self.host.is_none()
            && self.database.is_none()
            && self.user.is_none()
        {
            return Ok(None);
        }

        let backend = match &self.backend {
            Some(name) => DatabaseBackend::parse(name).ok_or_else(|| {
                ExerciseError::config(format!(
                    "Unknown backend '{name}'. Expected postgres, mysql or sqlite"
                ))
            })?,
            None if self.host.is_some() => DatabaseBackend::Postgres,
            None => DatabaseBackend::Sqlite,
        };

        Ok(Some(ConnectionConfig {
            backend,
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            password: None, // taken from the URL or PGPASSWORD
            ..Default::default()
        }))
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Parses the output format from the --format argument.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse().map_err(ExerciseError::config)
    }
}
