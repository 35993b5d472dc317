// CREATE TABLE generation from headers and inferred types

use super::ColumnType;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;

/// Character bound declared for TEXT columns unless configured otherwise
pub const DEFAULT_TEXT_LENGTH: usize = 255;

/// The table definition for one import, with its DDL rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateStatement {
    pub table_name: String,
    /// Columns in header order
    pub columns: Vec<(String, ColumnType)>,
    #[serde(skip)]
    pub sql: String,
}

impl CreateStatement {
    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// One `"name" TYPE` clause per header, in header order.
/// TEXT columns are bounded by `text_length`; other types are unbounded
pub fn build(
    table_name: &str,
    headers: &[String],
    types: &[ColumnType],
    text_length: usize,
) -> Result<CreateStatement> {
    if headers.is_empty() {
        return Err(Error::Schema("no columns".to_string()));
    }
    if headers.len() != types.len() {
        return Err(Error::Schema(format!(
            "{} headers but {} column types",
            headers.len(),
            types.len()
        )));
    }

    let mut seen = HashSet::new();
    for (position, name) in headers.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(Error::Schema(format!(
                "column {} has an empty name",
                position + 1
            )));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(Error::Schema(format!("duplicate column name '{}'", name)));
        }
    }

    let clauses: Vec<String> = headers
        .iter()
        .zip(types)
        .map(|(name, ty)| format!("{} {}", quote_ident(name), ty.sql_type(text_length)))
        .collect();

    let sql = format!(
        "CREATE TABLE {} ({})",
        quote_ident(table_name),
        clauses.join(", ")
    );

    Ok(CreateStatement {
        table_name: table_name.to_string(),
        columns: headers.iter().cloned().zip(types.iter().copied()).collect(),
        sql,
    })
}

/// Double-quoted identifier with embedded quotes doubled
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_clauses_in_header_order() {
        let stmt = build(
            "csv_table_1",
            &names(&["id", "price", "name", "active"]),
            &[
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Text,
                ColumnType::Boolean,
            ],
            DEFAULT_TEXT_LENGTH,
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            r#"CREATE TABLE "csv_table_1" ("id" BIGINT, "price" DOUBLE, "name" VARCHAR(255), "active" BOOLEAN)"#
        );
        assert_eq!(stmt.headers(), names(&["id", "price", "name", "active"]));
    }

    #[test]
    fn test_identifiers_are_quoted() {
        let stmt = build(
            "t",
            &names(&["first name", "say \"hi\""]),
            &[ColumnType::Text, ColumnType::Text],
            10,
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            r#"CREATE TABLE "t" ("first name" VARCHAR(10), "say ""hi""" VARCHAR(10))"#
        );
    }

    #[test]
    fn test_empty_headers_fail() {
        assert!(matches!(
            build("t", &[], &[], DEFAULT_TEXT_LENGTH),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_duplicate_and_blank_headers_fail() {
        let types = [ColumnType::Text, ColumnType::Text];
        assert!(matches!(
            build("t", &names(&["a", "A"]), &types, DEFAULT_TEXT_LENGTH),
            Err(Error::Schema(_))
        ));
        assert!(matches!(
            build("t", &names(&["a", ""]), &types, DEFAULT_TEXT_LENGTH),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_mismatched_lengths_fail() {
        assert!(build("t", &names(&["a"]), &[], DEFAULT_TEXT_LENGTH).is_err());
    }
}
