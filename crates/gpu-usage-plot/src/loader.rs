//! CSV loading for nvidia-smi stats dumps

use crate::{PlotError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Field values treated as missing
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single data row as read from the file
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Line number in the source file (1-based, header is line 1)
    pub line: u64,
    /// Value of the first column
    pub index: String,
    /// Remaining columns; `None` marks a missing value
    pub fields: Vec<Option<String>>,
}

impl RawRecord {
    /// Check whether any field of this record is missing
    pub fn has_missing(&self) -> bool {
        self.fields.iter().any(Option::is_none)
    }
}

/// Stats dump loaded into memory
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Source file
    pub path: PathBuf,
    /// Name of the index column
    pub index_name: String,
    /// Names of the remaining columns, aligned with `RawRecord::fields`
    pub columns: Vec<String>,
    /// Data rows in file order
    pub records: Vec<RawRecord>,
}

impl RawTable {
    /// Position of a named column within `RawRecord::fields`
    pub fn column_position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PlotError::MissingColumn(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Check whether a trimmed field denotes a missing value
pub fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

/// Load a stats dump from disk
pub fn load_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_table(file, path)?;
    debug!(
        "Loaded {} records with {} columns from {}",
        table.len(),
        table.columns.len() + 1,
        path.display()
    );
    Ok(table)
}

/// Read a stats dump from any reader; `path` is only used for error reporting
pub fn read_table<R: std::io::Read>(reader: R, path: &Path) -> Result<RawTable> {
    let csv_error = |source| PlotError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers().map_err(csv_error)?.clone();
    let mut names = headers.iter().map(str::to_string);
    let index_name = names.next().unwrap_or_default();
    let columns: Vec<String> = names.collect();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() > headers.len() {
            return Err(PlotError::MalformedRecord {
                line,
                reason: format!(
                    "expected at most {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            });
        }

        let mut values = record.iter();
        let index = values.next().unwrap_or_default().to_string();
        let mut fields: Vec<Option<String>> = values
            .map(|v| if is_missing(v) { None } else { Some(v.to_string()) })
            .collect();
        fields.resize(columns.len(), None);

        records.push(RawRecord {
            line,
            index,
            fields,
        });
    }

    Ok(RawTable {
        path: path.to_path_buf(),
        index_name,
        columns,
        records,
    })
}
