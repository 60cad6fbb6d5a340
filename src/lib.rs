//! SQL exercise runner.
//!
//! Creates the schema of a course module, loads its seed rows and runs its
//! documented statements against PostgreSQL, MySQL or SQLite. The binary is
//! a thin CLI over [`runner::ExerciseRunner`].

pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod runner;
