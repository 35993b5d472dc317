// Query results returned to callers
// Reads carry ordered records; writes carry an affected-row count

use super::statement::WriteKind;
use crate::storage::{Row, Value};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// One result row as an ordered column name -> value mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    /// Value of the first field with this name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

// Serialized as a JSON object that keeps column order
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Represents the result of an ad-hoc statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Rows returned from a SELECT query
    Read {
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    /// Rows touched by INSERT, UPDATE or DELETE
    Write { kind: WriteKind, affected: usize },
}

impl QueryResult {
    /// Number of rows returned or affected
    pub fn row_count(&self) -> usize {
        match self {
            QueryResult::Read { rows, .. } => rows.len(),
            QueryResult::Write { affected, .. } => *affected,
        }
    }

    /// The rows of a read as ordered records; empty for writes
    pub fn records(&self) -> Vec<Record> {
        match self {
            QueryResult::Read { columns, rows } => rows
                .iter()
                .map(|row| Record::new(columns.iter().cloned().zip(row.values.iter().cloned()).collect()))
                .collect(),
            QueryResult::Write { .. } => Vec::new(),
        }
    }

    /// Format the result as a string for display
    /// This creates a boxed table for SELECT results
    pub fn format(&self) -> String {
        match self {
            QueryResult::Write { kind, affected } => {
                format!("{}: {} row(s) affected", kind, affected)
            }
            QueryResult::Read { columns, rows } => {
                if rows.is_empty() {
                    return "No rows found".to_string();
                }

                // Calculate column widths
                let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
                for row in rows {
                    for (i, value) in row.values.iter().enumerate() {
                        widths[i] = widths[i].max(value.to_string().chars().count());
                    }
                }

                let border = |left: &str, mid: &str, right: &str| {
                    let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
                    format!("{}{}{}\n", left, cells.join(mid), right)
                };
                let line = |cells: Vec<String>| {
                    let padded: Vec<String> = cells
                        .iter()
                        .zip(&widths)
                        .map(|(cell, width)| format!(" {:<width$} ", cell, width = width))
                        .collect();
                    format!("│{}│\n", padded.join("│"))
                };

                let mut result = String::new();
                result.push_str(&border("┌", "┬", "┐"));
                result.push_str(&line(columns.clone()));
                result.push_str(&border("├", "┼", "┤"));
                for row in rows {
                    result.push_str(&line(row.values.iter().map(|v| v.to_string()).collect()));
                }
                result.push_str(&border("└", "┴", "┘"));
                result.push_str(&format!("\n{} row(s) returned", rows.len()));

                result
            }
        }
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryResult::Read { .. } => {
                let mut state = serializer.serialize_struct("QueryResult", 3)?;
                state.serialize_field("type", "SELECT")?;
                state.serialize_field("rowsCount", &self.row_count())?;
                state.serialize_field("rows", &self.records())?;
                state.end()
            }
            QueryResult::Write { kind, affected } => {
                let mut state = serializer.serialize_struct("QueryResult", 2)?;
                state.serialize_field("type", kind)?;
                state.serialize_field("affectedRows", affected)?;
                state.end()
            }
        }
    }
}
