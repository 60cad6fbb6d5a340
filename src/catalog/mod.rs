//! Course module catalog.
//!
//! A module variant is static data: ordered DDL, teardown, seed and query
//! statements written for one SQL dialect. The built-in variants are TOML
//! documents compiled into the binary; more can be loaded from a directory.

use crate::classify::SqlClassifier;
use crate::db::DatabaseBackend;
use crate::error::{ExerciseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

const BUILTIN_MODULES: &[(&str, &str)] = &[
    ("module_1.toml", include_str!("../../modules/module_1.toml")),
    ("module_1_postgres.toml", include_str!("../../modules/module_1_postgres.toml")),
    ("module_1_sqlite.toml", include_str!("../../modules/module_1_sqlite.toml")),
    ("module_2.toml", include_str!("../../modules/module_2.toml")),
    ("module_2_sqlite.toml", include_str!("../../modules/module_2_sqlite.toml")),
    ("module_3.toml", include_str!("../../modules/module_3.toml")),
    ("module_3_sqlite.toml", include_str!("../../modules/module_3_sqlite.toml")),
    ("module_4_mysql.toml", include_str!("../../modules/module_4_mysql.toml")),
    ("module_4_postgres.toml", include_str!("../../modules/module_4_postgres.toml")),
    ("module_4_sqlite.toml", include_str!("../../modules/module_4_sqlite.toml")),
];

/// SQL dialect a module variant is written in.
///
/// Dialects are never translated into each other; a variant only runs on the
/// backend that speaks its dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Returns the dialect as a string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// The backend that executes this dialect.
    pub fn backend(&self) -> DatabaseBackend {
        match self {
            Self::Mysql => DatabaseBackend::Mysql,
            Self::Postgres => DatabaseBackend::Postgres,
            Self::Sqlite => DatabaseBackend::Sqlite,
        }
    }

    /// Statement prefix that turns a query into a plan inspection.
    pub fn plan_prefix(&self) -> &'static str {
        match self {
            Self::Mysql | Self::Postgres => "EXPLAIN",
            Self::Sqlite => "EXPLAIN QUERY PLAN",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedStatement {
    /// Unique name within its section.
    pub name: String,

    /// SQL text, sent verbatim.
    pub sql: String,

    /// What the statement demonstrates.
    #[serde(default)]
    pub note: Option<String>,
}

/// A module variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub dialect: Dialect,
    #[serde(default)]
    pub description: Option<String>,

    /// Schema objects, in creation order.
    #[serde(default)]
    pub ddl: Vec<NamedStatement>,

    /// `DROP ... IF EXISTS` statements, dependents first.
    #[serde(default)]
    pub teardown: Vec<NamedStatement>,

    /// Seed inserts, parents before children.
    #[serde(default)]
    pub seed: Vec<NamedStatement>,

    /// Documented statements, in the order the lesson runs them.
    #[serde(default)]
    pub queries: Vec<NamedStatement>,
}

impl Module {
    /// Parses a module from TOML text. `origin` names the source in errors.
    pub fn from_toml(content: &str, origin: &str) -> Result<Self> {
        let module: Module = toml::from_str(content)
            .map_err(|e| ExerciseError::catalog(format!("Invalid module file {origin}: {e}")))?;
        module.validate(origin)?;
        Ok(module)
    }

    fn validate(&self, origin: &str) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ExerciseError::catalog(format!(
                "Module in {origin} has an empty id"
            )));
        }

        let sections = [
            ("ddl", &self.ddl),
            ("teardown", &self.teardown),
            ("seed", &self.seed),
            ("queries", &self.queries),
        ];
        for (section, statements) in sections {
            let mut seen = HashSet::new();
            for statement in statements {
                if statement.sql.trim().is_empty() {
                    return Err(ExerciseError::catalog(format!(
                        "{}: {section} statement '{}' has no SQL",
                        self.id, statement.name
                    )));
                }
                if !seen.insert(statement.name.as_str()) {
                    return Err(ExerciseError::catalog(format!(
                        "{}: duplicate {section} statement name '{}'",
                        self.id, statement.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Looks up a documented statement by name, with its position.
    pub fn query(&self, name: &str) -> Result<(usize, &NamedStatement)> {
        self.queries
            .iter()
            .enumerate()
            .find(|(_, q)| q.name == name)
            .ok_or_else(|| {
                ExerciseError::catalog(format!("Module '{}' has no query named '{name}'", self.id))
            })
    }

    /// Number of `VALUES` tuples the seed section inserts into each table.
    ///
    /// Table names are keyed as written in the first insert that names them.
    pub fn declared_rows(&self) -> Result<BTreeMap<String, usize>> {
        let classifier = SqlClassifier::new(self.dialect);
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();

        for statement in &self.seed {
            let inserted = classifier.inserted_rows(&statement.sql).ok_or_else(|| {
                ExerciseError::catalog(format!(
                    "{}: seed statement '{}' is not a plain INSERT ... VALUES",
                    self.id, statement.name
                ))
            })?;

            let key = counts
                .keys()
                .find(|k| k.eq_ignore_ascii_case(&inserted.table))
                .cloned()
                .unwrap_or(inserted.table);
            *counts.entry(key).or_default() += inserted.rows;
        }

        Ok(counts)
    }
}

/// All module variants known to this run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modules: Vec<Module>,
}

impl Catalog {
    /// The module variants compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::default();
        for (origin, content) in BUILTIN_MODULES {
            catalog.add(Module::from_toml(content, origin)?)?;
        }
        Ok(catalog)
    }

    /// Adds a module; ids must be unique.
    pub fn add(&mut self, module: Module) -> Result<()> {
        if self.modules.iter().any(|m| m.id == module.id) {
            return Err(ExerciseError::catalog(format!(
                "Duplicate module id '{}'",
                module.id
            )));
        }
        debug!("Registered module {} ({})", module.id, module.dialect);
        self.modules.push(module);
        Ok(())
    }

    /// Loads every `*.toml` module in a directory, in file-name order.
    /// Returns how many modules were added.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ExerciseError::catalog(format!(
                "Cannot read modules directory {}: {e}",
                dir.display()
            ))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in &paths {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ExerciseError::catalog(format!("Cannot read {}: {e}", path.display()))
            })?;
            self.add(Module::from_toml(&content, &path.display().to_string())?)?;
        }

        Ok(paths.len())
    }

    /// Looks up a module variant by id.
    pub fn module(&self, id: &str) -> Result<&Module> {
        self.modules
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ExerciseError::catalog(format!("Unknown module '{id}'")))
    }

    /// All module variants, in registration order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }
}
