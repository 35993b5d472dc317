// Schema module - column type inference and CREATE TABLE generation
pub mod builder;
pub mod inference;

pub use builder::{build, CreateStatement, DEFAULT_TEXT_LENGTH};
pub use inference::{infer, infer_all};

use serde::Serialize;
use std::fmt;

/// The logical column types inferred from CSV data.
/// Ordered by permissiveness: TEXT accepts anything FLOAT does, and so on down
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Boolean,
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Engine type used for this column in generated DDL
    pub fn sql_type(self, text_length: usize) -> String {
        match self {
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Integer => "BIGINT".to_string(),
            ColumnType::Float => "DOUBLE".to_string(),
            ColumnType::Text => format!("VARCHAR({})", text_length),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Text => "TEXT",
        };
        f.write_str(name)
    }
}
