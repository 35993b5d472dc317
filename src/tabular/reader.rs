// Tabular reader
// Turns a CSV byte stream into headers plus string rows. Quoting, embedded
// delimiters, embedded newlines and doubled quotes are handled by the csv crate

use crate::error::{Error, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;

/// Headers and rows exactly as read, every cell trimmed
/// Rows may be shorter or longer than the header list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Read a whole table; the first record is the header
pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = csv_reader.records();

    let headers = match records.next() {
        Some(record) => to_cells(&record?),
        None => return Err(Error::EmptyInput),
    };

    // A whitespace-only first line carries no columns
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::EmptyInput);
    }

    let rows = records
        .map(|record| record.map(|r| to_cells(&r)).map_err(Error::from))
        .collect::<Result<Vec<_>>>()?;

    Ok(RawTable { headers, rows })
}

fn to_cells(record: &StringRecord) -> Vec<String> {
    record.iter().map(|cell| cell.trim().to_string()).collect()
}
