use crate::jobs::{JobError, Table};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

/// One bare id per line, no header. Lines are trimmed and blanks skipped.
pub fn read_ids<R: BufRead>(reader: R) -> Result<HashSet<String>, JobError> {
    let mut ids = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Rows whose key is in `ids`, in input order, under the input header.
/// The key is the first column unless `key_column` names another.
pub fn filter_by_key(
    table: &Table,
    ids: &HashSet<String>,
    key_column: Option<&str>,
) -> Result<Table, JobError> {
    let key = match key_column {
        Some(name) => table.require_column(name)?,
        None => 0,
    };

    let mut out = Table::new(table.name.clone(), table.headers.clone());
    out.rows = table
        .rows
        .iter()
        .filter(|row| row.get(key).is_some_and(|value| ids.contains(value)))
        .cloned()
        .collect();
    Ok(out)
}

pub fn run(input: &Path, ids_path: &Path, output: &Path, key_column: Option<&str>) -> Result<()> {
    let ids_file = std::fs::File::open(ids_path)
        .with_context(|| format!("Failed to open id list {}", ids_path.display()))?;
    let ids = read_ids(std::io::BufReader::new(ids_file))
        .with_context(|| format!("Failed to read id list {}", ids_path.display()))?;
    let table = Table::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let filtered = filter_by_key(&table, &ids, key_column)?;
    filtered
        .to_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        ids = ids.len(),
        rows_in = table.rows.len(),
        rows_out = filtered.rows.len(),
        "Filtered listings written to {}",
        output.display()
    );
    Ok(())
}
