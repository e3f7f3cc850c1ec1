use std::fs::File;
use std::io::Read;
use std::path::Path;

use simt_core::{FieldValue, Row};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RowsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("CSV has no header row")]
    MissingHeader,
}

/// Loads business rows from a headered CSV. Column names become field names;
/// cells are kept as text and empty cells become `Null` so layout defaults
/// apply to them.
pub fn read_rows<R: Read>(data: R, delimiter: u8) -> Result<Vec<Row>, RowsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(RowsError::MissingHeader);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, cell)| {
                let value = if cell.trim().is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Text(cell.to_string())
                };
                (name.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

pub fn read_rows_file(path: &Path, delimiter: u8) -> Result<Vec<Row>, RowsError> {
    read_rows(File::open(path)?, delimiter)
}
