// Tabular text module - CSV in and CSV out
pub mod reader;
pub mod writer;

pub use reader::{read_table, RawTable};
pub use writer::{write_table, ExportQuoting};
