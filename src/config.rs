// Configuration for the pipeline
// Loaded from an optional JSON file; every field has a default

use crate::error::{Error, Result};
use crate::query::executor::DEFAULT_ROWS_PER_PAGE;
use crate::query::StatementPolicy;
use crate::schema::DEFAULT_TEXT_LENGTH;
use crate::tabular::ExportQuoting;
use serde::Deserialize;
use std::path::Path;

/// How imports without an explicit name get their table identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNaming {
    /// `<prefix>_<n>` from a per-service counter
    #[default]
    Sequential,
    /// `<prefix>_<hash>` from the imported bytes; re-importing the same file
    /// replaces the earlier table
    ContentHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// VARCHAR bound for inferred TEXT columns
    pub text_length: usize,
    pub table_naming: TableNaming,
    pub table_prefix: String,
    pub export_quoting: ExportQuoting,
    /// Also reject UPDATE statements without WHERE
    pub reject_unqualified_update: bool,
    pub rows_per_page: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_length: DEFAULT_TEXT_LENGTH,
            table_naming: TableNaming::Sequential,
            table_prefix: "csv_table".to_string(),
            export_quoting: ExportQuoting::Never,
            reject_unqualified_update: false,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

impl Config {
    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.text_length == 0 {
            return Err(Error::Config("text_length must be positive".to_string()));
        }
        if self.rows_per_page == 0 {
            return Err(Error::Config("rows_per_page must be positive".to_string()));
        }
        let prefix_ok = self
            .table_prefix
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self
                .table_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !prefix_ok {
            return Err(Error::Config(format!(
                "table_prefix '{}' is not a plain identifier",
                self.table_prefix
            )));
        }
        Ok(())
    }

    /// The validation policy these settings describe
    pub fn policy(&self) -> StatementPolicy {
        if self.reject_unqualified_update {
            StatementPolicy::strict()
        } else {
            StatementPolicy::standard()
        }
    }
}
