// Tabular writer
// Serializes a header and rows back to CSV text. NULL becomes an empty cell

use crate::error::Result;
use crate::storage::{Row, Value};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Deserialize;

/// How cells are quoted on export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportQuoting {
    /// Cells are written verbatim; delimiters, quotes and newlines inside a
    /// cell do not survive a re-import
    #[default]
    Never,
    /// Cells containing a delimiter, quote or newline are quoted
    Necessary,
}

impl From<ExportQuoting> for QuoteStyle {
    fn from(quoting: ExportQuoting) -> Self {
        match quoting {
            ExportQuoting::Never => QuoteStyle::Never,
            ExportQuoting::Necessary => QuoteStyle::Necessary,
        }
    }
}

/// Write a header line and one line per row, each terminated by `\n`.
/// No rows means no output at all, not even the header
pub fn write_table(headers: &[String], rows: &[Row], quoting: ExportQuoting) -> Result<Vec<u8>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = WriterBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .quote_style(quoting.into())
        .terminator(Terminator::Any(b'\n'));
    let mut writer = builder.from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        // csv writes a lone empty field as "" whatever the quote style
        if quoting == ExportQuoting::Never && is_blank_record(row) {
            writer.flush()?;
            let mut out = writer.into_inner().map_err(|e| {
                std::io::Error::new(e.error().kind(), e.error().to_string())
            })?;
            out.push(b'\n');
            writer = builder.from_writer(out);
            continue;
        }
        writer.write_record(row.values.iter().map(cell_text))?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()).into())
}

fn is_blank_record(row: &Row) -> bool {
    matches!(row.values.as_slice(), [only] if cell_text(only).is_empty())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
