use crate::jobs::{JobError, Table};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub const DEFAULT_COLUMNS: [&str; 2] = ["Model", "Size"];

/// Empty the named columns on every row. All of them must be in the header;
/// nothing is changed when one is missing.
pub fn redact_columns(table: &Table, columns: &[String]) -> Result<Table, JobError> {
    let indices = columns
        .iter()
        .map(|name| table.require_column(name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = table.clone();
    for row in &mut out.rows {
        for &i in &indices {
            if let Some(value) = row.get_mut(i) {
                value.clear();
            }
        }
    }
    Ok(out)
}

pub fn run(input: &Path, output: &Path, columns: &[String]) -> Result<()> {
    let table = Table::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let redacted = redact_columns(&table, columns)?;
    redacted
        .to_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        rows_in = table.rows.len(),
        rows_out = redacted.rows.len(),
        columns = %columns.join(", "),
        "Redacted listings written to {}",
        output.display()
    );
    Ok(())
}
