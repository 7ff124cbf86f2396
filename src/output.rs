use crate::commands::Operation;
use colored::Colorize;
use serde_json::Value;
use tabled::{Table, Tabled};

/// Row of the `--list` table
#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Operation")]
    name: &'static str,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Wakes")]
    wakes: &'static str,
    #[tabled(rename = "Arguments")]
    params: String,
    #[tabled(rename = "Description")]
    about: &'static str,
}

impl From<&Operation> for OperationRow {
    fn from(op: &Operation) -> Self {
        Self {
            name: op.name,
            method: op.method.to_string(),
            wakes: if op.requires_online { "yes" } else { "no" },
            params: op.params.join(", "),
            about: op.about,
        }
    }
}

/// Initialize output settings
pub fn init(color: bool) {
    if !color {
        colored::control::set_override(false);
    }
}

/// Print the operation registry as a table
pub fn print_operations(ops: &[&Operation]) {
    let rows: Vec<OperationRow> = ops.iter().map(|op| OperationRow::from(*op)).collect();
    println!("{}", Table::new(rows));
}

/// Print an operation result: strings raw, everything else as pretty JSON
pub fn print_result(result: &Value) -> Result<(), serde_json::Error> {
    println!("{}", render_result(result)?);
    Ok(())
}

fn render_result(result: &Value) -> Result<String, serde_json::Error> {
    match result {
        Value::String(s) => Ok(s.clone()),
        other => serde_json::to_string_pretty(other),
    }
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{}: {}", "error".red().bold(), message);
}
