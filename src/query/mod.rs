// Query module - handles SQL validation, parsing and execution
pub mod executor;
pub mod parser;
pub mod predicate;
pub mod result;
pub mod statement;
pub mod validator;

pub use executor::{ExecOutcome, QueryExecutor};
pub use parser::{Query, QueryParser};
pub use result::{QueryResult, Record};
pub use statement::{StatementKind, WriteKind};
pub use validator::{Rejection, StatementPolicy};
