// csvql - load CSV files into an in-process SQL engine, query them, export them again
// This is the library root that exposes the public API

pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod service;
pub mod storage;
pub mod tabular;

// Re-export commonly used types for convenience
pub use config::{Config, TableNaming};
pub use error::{Error, Result};
pub use query::{QueryExecutor, QueryParser, QueryResult, Record, Rejection, StatementPolicy, WriteKind};
pub use schema::ColumnType;
pub use service::{CsvSql, ExportFile, ImportSummary};
pub use storage::{Column, DataType, Row, Schema, Value};
pub use tabular::{ExportQuoting, RawTable};
