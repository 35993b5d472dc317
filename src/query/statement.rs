// Statement classification by leading keyword
// Ad-hoc statements are dispatched on their first word before parsing

use serde::Serialize;
use std::fmt;

/// The write statements that report an affected-row count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for WriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteKind::Insert => "INSERT",
            WriteKind::Update => "UPDATE",
            WriteKind::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Read,
    Write(WriteKind),
}

impl StatementKind {
    /// Classify by the case-insensitive prefix of the trimmed statement.
    /// Returns None for anything that is not SELECT/INSERT/UPDATE/DELETE
    pub fn classify(statement: &str) -> Option<Self> {
        let normalized = statement.trim().to_lowercase();
        if normalized.starts_with("select") {
            Some(StatementKind::Read)
        } else if normalized.starts_with("insert") {
            Some(StatementKind::Write(WriteKind::Insert))
        } else if normalized.starts_with("update") {
            Some(StatementKind::Write(WriteKind::Update))
        } else if normalized.starts_with("delete") {
            Some(StatementKind::Write(WriteKind::Delete))
        } else {
            None
        }
    }
}

/// First word of a statement, for error messages
pub fn leading_keyword(statement: &str) -> &str {
    statement.split_whitespace().next().unwrap_or("")
}
