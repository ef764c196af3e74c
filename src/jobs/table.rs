use crate::jobs::JobError;
use std::io::{Read, Write};
use std::path::Path;

/// A whole CSV file: header plus rows, every value a string
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a header-first CSV. Short rows are padded to the header width.
    pub fn read<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, JobError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut table = Table::new(name, headers);

        for record in rdr.records() {
            let mut row: Vec<String> = record?.iter().map(str::to_string).collect();
            if row.len() < table.headers.len() {
                row.resize(table.headers.len(), String::new());
            }
            table.rows.push(row);
        }

        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, JobError> {
        let file = std::fs::File::open(path)?;
        Self::read(path.display().to_string(), file)
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), JobError> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_path(&self, path: &Path) -> Result<(), JobError> {
        let file = std::fs::File::create(path)?;
        self.write(file)
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, or a missing-column error naming this table
    pub fn require_column(&self, name: &str) -> Result<usize, JobError> {
        self.column(name).ok_or_else(|| JobError::MissingColumn {
            file: self.name.clone(),
            column: name.to_string(),
        })
    }
}
