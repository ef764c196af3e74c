//! Batch jobs over flat CSV exports. Each one reads whole files, transforms
//! them in memory and writes a new file; none shares state with another.

pub mod filter;
pub mod merge;
pub mod redact;
pub mod schema_map;
pub mod table;

use thiserror::Error;

pub use table::Table;

/// Join key used by the listing exports
pub const ITEM_ID: &str = "Item ID";

#[derive(Error, Debug)]
pub enum JobError {
    #[error("{file} has no '{column}' column")]
    MissingColumn { file: String, column: String },

    #[error("Row {row}: cannot read '{value}' in column '{column}' as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
