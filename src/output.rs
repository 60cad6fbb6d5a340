//! Rendering of runner results for the command line.
//!
//! Text output draws result sets with comfy-table; JSON output maps each
//! row to an object keyed by column name, with decimals kept as exact
//! strings.

use crate::catalog::{Catalog, Module};
use crate::db::{QueryResult, StatementOutcome};
use crate::error::{ExerciseError, Result};
use crate::runner::ExerciseReport;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use serde_json::{json, Value as JsonValue};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables and short status lines.
    #[default]
    Text,
    /// One JSON document per command.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

/// Draws a result set as a text table followed by its row count.
pub fn result_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return format!("({} rows)", result.row_count());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(result.columns.iter().map(|c| Cell::new(&c.name)));
    for row in &result.rows {
        table.add_row(row.iter().map(|v| Cell::new(v.to_display_string())));
    }

    format!("{table}\n({} rows)", result.row_count())
}

/// JSON form of a result set.
pub fn result_json(result: &QueryResult) -> JsonValue {
    let columns: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    let rows: Vec<JsonValue> = result.records().map(|r| r.to_json()).collect();
    json!({
        "columns": columns,
        "rows": rows,
        "row_count": result.row_count(),
        "execution_time_ms": result.execution_time.as_millis() as u64,
    })
}

/// JSON form of a statement outcome.
pub fn outcome_json(outcome: &StatementOutcome) -> JsonValue {
    match outcome {
        StatementOutcome::Rows(result) => result_json(result),
        StatementOutcome::Affected(n) => json!({ "affected_rows": n }),
    }
}

fn outcome_text(outcome: &StatementOutcome) -> String {
    match outcome {
        StatementOutcome::Rows(result) => result_table(result),
        StatementOutcome::Affected(1) => "1 row affected".to_string(),
        StatementOutcome::Affected(n) => format!("{n} rows affected"),
    }
}

fn to_pretty(value: &JsonValue) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ExerciseError::internal(format!("Failed to encode JSON: {e}")))
}

/// Renders the outcome of one named statement.
pub fn render_outcome(
    name: &str,
    outcome: &StatementOutcome,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("-- {name}\n{}", outcome_text(outcome))),
        OutputFormat::Json => to_pretty(&json!({
            "query": name,
            "result": outcome_json(outcome),
        })),
    }
}

/// Renders a query plan.
pub fn render_plan(name: &str, plan: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("-- plan for {name}\n{}", result_table(plan))),
        OutputFormat::Json => to_pretty(&json!({
            "query": name,
            "plan": result_json(plan),
        })),
    }
}

/// Renders a one-line status message, e.g. after `setup`.
pub fn render_status(
    module: &str,
    action: &str,
    rows: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(match rows {
            Some(rows) => format!("{module}: {action} ({rows} rows)"),
            None => format!("{module}: {action}"),
        }),
        OutputFormat::Json => to_pretty(&json!({
            "module": module,
            "action": action,
            "rows": rows,
        })),
    }
}

/// Renders everything an `exercise` run produced.
pub fn render_report(report: &ExerciseReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "{}: schema created, {} rows seeded\n",
                report.module, report.seeded_rows
            );
            for (name, outcome) in &report.results {
                out.push_str(&format!("\n-- {name}\n{}\n", outcome_text(outcome)));
            }
            Ok(out.trim_end().to_string())
        }
        OutputFormat::Json => {
            let results: Vec<JsonValue> = report
                .results
                .iter()
                .map(|(name, outcome)| json!({ "query": name, "result": outcome_json(outcome) }))
                .collect();
            to_pretty(&json!({
                "module": report.module,
                "seeded_rows": report.seeded_rows,
                "results": results,
            }))
        }
    }
}

/// Lists the catalog's module variants.
pub fn render_catalog(catalog: &Catalog, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Module", "Dialect", "Title", "Queries"]);
            for module in catalog.modules() {
                table.add_row(vec![
                    Cell::new(&module.id),
                    Cell::new(module.dialect),
                    Cell::new(&module.title),
                    Cell::new(module.queries.len()),
                ]);
            }
            Ok(table.to_string())
        }
        OutputFormat::Json => {
            let modules: Vec<JsonValue> = catalog
                .modules()
                .iter()
                .map(|m| {
                    json!({
                        "id": m.id,
                        "dialect": m.dialect,
                        "title": m.title,
                        "queries": m.queries.len(),
                    })
                })
                .collect();
            to_pretty(&JsonValue::Array(modules))
        }
    }
}

/// Shows one module: its description and every statement, section by section.
pub fn render_module(module: &Module, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut out = format!("{} [{}]\n{}\n", module.id, module.dialect, module.title);
            if let Some(description) = &module.description {
                out.push_str(&format!("\n{}\n", description.trim()));
            }
            let sections = [
                ("ddl", &module.ddl),
                ("seed", &module.seed),
                ("queries", &module.queries),
                ("teardown", &module.teardown),
            ];
            for (section, statements) in sections {
                out.push_str(&format!("\n== {section} ==\n"));
                for statement in statements {
                    out.push_str(&format!("\n-- {}", statement.name));
                    if let Some(note) = &statement.note {
                        out.push_str(&format!(": {note}"));
                    }
                    out.push_str(&format!("\n{};\n", statement.sql.trim()));
                }
            }
            Ok(out.trim_end().to_string())
        }
        OutputFormat::Json => {
            let value = serde_json::to_value(module)
                .map_err(|e| ExerciseError::internal(format!("Failed to encode JSON: {e}")))?;
            to_pretty(&value)
        }
    }
}
