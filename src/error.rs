// Error taxonomy for the import/query/export pipeline
// The engine itself works with anyhow; its messages end up in Error::Execution

use crate::query::validator::Rejection;
use thiserror::Error;

/// Everything that can go wrong in a single pipeline call
#[derive(Debug, Error)]
pub enum Error {
    /// The input had no header record
    #[error("CSV input is empty")]
    EmptyInput,

    /// The tabular reader could not decode a record
    #[error("malformed CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Column definitions could not be built from the headers
    #[error("cannot build table schema: {0}")]
    Schema(String),

    /// The statement was blocked by the validation policy
    #[error("query rejected: {0}")]
    Rejected(Rejection),

    /// The statement's leading keyword is not one we dispatch
    #[error("unsupported SQL statement: {0}")]
    UnsupportedStatement(String),

    /// The engine failed while creating, inserting or querying
    #[error("SQL execution failed: {0}")]
    Execution(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for conditions caused by the caller's input rather than the engine
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::Parse { .. }
                | Error::Schema(_)
                | Error::Rejected(_)
                | Error::UnsupportedStatement(_)
        )
    }
}

impl From<Rejection> for Error {
    fn from(rejection: Rejection) -> Self {
        Error::Rejected(rejection)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Execution(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            _ => Error::Parse { line, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
