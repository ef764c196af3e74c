use crate::jobs::{JobError, Table};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Overwrite columns of `secondary` with values from `primary` where the keys match.
///
/// Only columns present in both headers are copied, narrowed to `columns`
/// when given. Rows with no match in `primary` pass through untouched. The
/// output keeps the secondary header. When the primary repeats a key the
/// last row wins.
pub fn merge_by_key(
    primary: &Table,
    secondary: &Table,
    key_column: &str,
    columns: &[String],
) -> Result<Table, JobError> {
    let primary_key = primary.require_column(key_column)?;
    let secondary_key = secondary.require_column(key_column)?;

    for column in columns {
        secondary.require_column(column)?;
        primary.require_column(column)?;
    }

    // (secondary index, primary index) for every column we copy
    let copied: Vec<(usize, usize)> = secondary
        .headers
        .iter()
        .enumerate()
        .filter(|&(_, name)| columns.is_empty() || columns.contains(name))
        .filter_map(|(si, name)| primary.column(name).map(|pi| (si, pi)))
        .collect();
    debug!(columns = copied.len(), "Columns taken from the primary file");

    let by_key: HashMap<&str, &Vec<String>> = primary
        .rows
        .iter()
        .filter_map(|row| row.get(primary_key).map(|key| (key.as_str(), row)))
        .collect();

    let mut out = Table::new(secondary.name.clone(), secondary.headers.clone());
    let mut matched = 0;
    for row in &secondary.rows {
        let mut row = row.clone();
        if let Some(source) = row.get(secondary_key).and_then(|key| by_key.get(key.as_str())) {
            for &(si, pi) in &copied {
                if let (Some(target), Some(value)) = (row.get_mut(si), source.get(pi)) {
                    target.clone_from(value);
                }
            }
            matched += 1;
        }
        out.rows.push(row);
    }

    debug!(matched, unmatched = out.rows.len() - matched, "Merged rows");
    Ok(out)
}

pub fn run(
    primary_path: &Path,
    secondary_path: &Path,
    output: &Path,
    key_column: &str,
    columns: &[String],
) -> Result<()> {
    let primary = Table::from_path(primary_path)
        .with_context(|| format!("Failed to read {}", primary_path.display()))?;
    let secondary = Table::from_path(secondary_path)
        .with_context(|| format!("Failed to read {}", secondary_path.display()))?;

    let merged = merge_by_key(&primary, &secondary, key_column, columns)?;
    merged
        .to_path(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        primary_rows = primary.rows.len(),
        rows_in = secondary.rows.len(),
        rows_out = merged.rows.len(),
        "Merged listings written to {}",
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, csv: &str) -> Table {
        Table::read(name, csv.as_bytes()).unwrap()
    }

    fn primary() -> Table {
        table(
            "ebay_listings.csv",
            "Item ID,Title,Model,Size,Price\n1,Scarf,S1,M,10\n2,Boots,B2,10,50\n",
        )
    }

    fn secondary() -> Table {
        table(
            "messed_up.csv",
            "Item ID,Title,Size,Notes\n2,boots??,,keep me\n9,Other,XL,untouched\n1,sc4rf,?,\n",
        )
    }

    #[test]
    fn matched_rows_take_shared_columns_from_primary() {
        let out = merge_by_key(&primary(), &secondary(), "Item ID", &[]).unwrap();

        assert_eq!(out.headers, vec!["Item ID", "Title", "Size", "Notes"]);
        assert_eq!(out.rows[0], vec!["2", "Boots", "10", "keep me"]);
        assert_eq!(out.rows[1], vec!["9", "Other", "XL", "untouched"]);
        assert_eq!(out.rows[2], vec!["1", "Scarf", "M", ""]);
    }

    #[test]
    fn named_columns_limit_what_is_copied() {
        let out = merge_by_key(&primary(), &secondary(), "Item ID", &["Size".to_string()]).unwrap();
        assert_eq!(out.rows[0], vec!["2", "boots??", "10", "keep me"]);
    }

    #[test]
    fn merging_again_changes_nothing() {
        let once = merge_by_key(&primary(), &secondary(), "Item ID", &[]).unwrap();
        let twice = merge_by_key(&primary(), &once, "Item ID", &[]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn last_duplicate_in_primary_wins() {
        let primary = table("p.csv", "Item ID,Size\n1,S\n1,L\n");
        let secondary = table("s.csv", "Item ID,Size\n1,?\n");
        let out = merge_by_key(&primary, &secondary, "Item ID", &[]).unwrap();
        assert_eq!(out.rows[0], vec!["1", "L"]);
    }

    #[test]
    fn key_and_named_columns_must_exist() {
        let no_key = table("s.csv", "ID,Size\n1,?\n");
        assert!(matches!(
            merge_by_key(&primary(), &no_key, "Item ID", &[]),
            Err(JobError::MissingColumn { ref file, .. }) if file == "s.csv"
        ));
        assert!(matches!(
            merge_by_key(&primary(), &secondary(), "Item ID", &["Notes".to_string()]),
            Err(JobError::MissingColumn { ref column, .. }) if column == "Notes"
        ));
    }

    #[test]
    fn run_merges_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let primary_path = dir.path().join("ebay_listings.csv");
        let secondary_path = dir.path().join("messed_up.csv");
        let output = dir.path().join("combined.csv");
        std::fs::write(&primary_path, "Item ID,Title,Size\n1,Scarf,M\n").unwrap();
        std::fs::write(&secondary_path, "Item ID,Title,Size\n1,sc4rf,?\n7,Hat,S\n").unwrap();

        run(&primary_path, &secondary_path, &output, crate::jobs::ITEM_ID, &[]).unwrap();

        let written = Table::from_path(&output).unwrap();
        assert_eq!(written.rows, vec![vec!["1", "Scarf", "M"], vec!["7", "Hat", "S"]]);
    }
}
