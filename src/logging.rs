//! Logging configuration for the exercise runner.
//!
//! Logs go to stderr so they never mix with results on stdout, or to a file
//! when `--log-file` is given. `RUST_LOG` overrides the default `info` level.

use std::fs::{self, File};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use crate::error::{ExerciseError, Result};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging to a file, truncating it on each run.
pub fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ExerciseError::config(format!(
                "Could not create log directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let log_file = File::create(path).map_err(|e| {
        ExerciseError::config(format!("Could not create log file {}: {e}", path.display()))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false) // No ANSI colors in file output
        .init();
    Ok(())
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
