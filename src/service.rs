// The import -> query -> export pipeline
// CsvSql owns the engine behind one mutex. An import's create-then-insert
// sequence runs under a single lock, as does every query and export

use crate::config::{Config, TableNaming};
use crate::error::{Error, Result};
use crate::query::statement::leading_keyword;
use crate::query::{
    ExecOutcome, Query, QueryExecutor, QueryParser, QueryResult, StatementKind, StatementPolicy,
    WriteKind,
};
use crate::schema::{self, ColumnType};
use crate::storage::{Column, Value};
use crate::tabular::{self, RawTable};
use serde::Serialize;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// What an import produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub table_name: String,
    pub headers: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: usize,
    pub columns: usize,
}

/// Export bytes plus the hints a transport needs to offer them as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub const CSV_CONTENT_TYPE: &str = "text/csv";

pub struct CsvSql {
    config: Config,
    policy: StatementPolicy,
    engine: Mutex<QueryExecutor>,
    next_table: AtomicU64,
}

impl CsvSql {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            policy: config.policy(),
            engine: Mutex::new(QueryExecutor::with_rows_per_page(config.rows_per_page)),
            next_table: AtomicU64::new(0),
            config,
        })
    }

    /// Import CSV into a freshly named table
    pub fn import<R: Read>(&self, mut reader: R) -> Result<ImportSummary> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let raw = tabular::read_table(bytes.as_slice())?;

        let mut engine = self.engine()?;
        let (table_name, replace) = match self.config.table_naming {
            TableNaming::Sequential => (self.next_sequential_name(&engine), false),
            TableNaming::ContentHash => (
                format!("{}_{:016x}", self.config.table_prefix, seahash::hash(&bytes)),
                true,
            ),
        };

        self.materialize(&mut engine, raw, table_name, replace)
    }

    /// Import CSV under a caller-chosen name, replacing any table of that name
    pub fn import_as<R: Read>(&self, reader: R, table_name: &str) -> Result<ImportSummary> {
        let table_name = table_name.trim();
        if table_name.is_empty() {
            return Err(Error::Schema("table name is empty".to_string()));
        }

        let raw = tabular::read_table(reader)?;
        let mut engine = self.engine()?;
        self.materialize(&mut engine, raw, table_name.to_string(), true)
    }

    /// Infer, create and bulk insert. A failed insert leaves the created
    /// table in place with whatever rows made it in
    fn materialize(
        &self,
        engine: &mut QueryExecutor,
        raw: RawTable,
        table_name: String,
        replace: bool,
    ) -> Result<ImportSummary> {
        info!(
            rows = raw.row_count(),
            columns = raw.column_count(),
            "CSV parsed"
        );

        let types = schema::infer_all(&raw);
        let create = schema::build(&table_name, &raw.headers, &types, self.config.text_length)?;
        debug!(sql = %create.sql, "generated table definition");

        let query = QueryParser::parse(&create.sql)?;
        if replace && engine.drop_table(&table_name) {
            info!(table = %table_name, "replacing existing table");
        }
        match engine.execute(query)? {
            ExecOutcome::Created { table_name } => info!(table = %table_name, "created table"),
            other => {
                return Err(Error::Execution(format!(
                    "unexpected engine outcome: {:?}",
                    other
                )))
            }
        }

        let width = raw.headers.len();
        let rows: Vec<Vec<Value>> = raw
            .rows
            .into_iter()
            .map(|cells| {
                // Missing trailing cells are NULL; extra cells are dropped
                let mut cells = cells.into_iter();
                (0..width)
                    .map(|_| cells.next().map_or(Value::Null, Value::Text))
                    .collect()
            })
            .collect();
        let row_count = rows.len();

        if row_count > 0 {
            engine.execute(Query::Insert {
                table_name: table_name.clone(),
                columns: None,
                rows,
            })?;
        }

        info!(table = %table_name, rows = row_count, "inserted rows");

        Ok(ImportSummary {
            table_name,
            headers: create.headers(),
            column_types: types,
            rows: row_count,
            columns: width,
        })
    }

    /// Validate, classify and run one ad-hoc statement
    pub fn execute(&self, statement: &str) -> Result<QueryResult> {
        if let Err(rejection) = self.policy.validate(statement) {
            warn!(%rejection, statement, "statement rejected");
            return Err(rejection.into());
        }

        let kind = StatementKind::classify(statement).ok_or_else(|| {
            Error::UnsupportedStatement(leading_keyword(statement).to_string())
        })?;

        let query = QueryParser::parse(statement)?;
        if !kind_matches(kind, &query) {
            return Err(Error::UnsupportedStatement(
                leading_keyword(statement).to_string(),
            ));
        }

        let outcome = self.engine()?.execute(query)?;

        let result = match (kind, outcome) {
            (StatementKind::Read, ExecOutcome::Rows { columns, rows }) => {
                QueryResult::Read { columns, rows }
            }
            (StatementKind::Write(kind), ExecOutcome::Affected(affected)) => {
                QueryResult::Write { kind, affected }
            }
            (_, outcome) => {
                return Err(Error::Execution(format!(
                    "unexpected engine outcome: {:?}",
                    outcome
                )))
            }
        };

        match &result {
            QueryResult::Read { rows, .. } => {
                info!(statement, rows = rows.len(), "executed SELECT")
            }
            QueryResult::Write { kind, affected } => {
                info!(statement, %kind, affected, "executed write")
            }
        }

        Ok(result)
    }

    /// Serialize a whole table as CSV in its declared column order.
    /// An empty table yields no bytes at all
    pub fn export(&self, table_name: &str) -> Result<Vec<u8>> {
        let outcome = self.engine()?.execute(Query::select_all(table_name))?;
        let (columns, rows) = match outcome {
            ExecOutcome::Rows { columns, rows } => (columns, rows),
            other => {
                return Err(Error::Execution(format!(
                    "unexpected engine outcome: {:?}",
                    other
                )))
            }
        };

        let bytes = tabular::write_table(&columns, &rows, self.config.export_quoting)?;
        info!(table = table_name, rows = rows.len(), "exported table");
        Ok(bytes)
    }

    pub fn export_file(&self, table_name: &str) -> Result<ExportFile> {
        Ok(ExportFile {
            filename: format!("{}.csv", table_name),
            content_type: CSV_CONTENT_TYPE,
            bytes: self.export(table_name)?,
        })
    }

    pub fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.engine()?.list_tables())
    }

    /// Column definitions of a table, in declared order
    pub fn describe(&self, table_name: &str) -> Result<Vec<Column>> {
        let engine = self.engine()?;
        let table = engine
            .get_table(table_name)
            .ok_or_else(|| Error::Execution(format!("Table '{}' not found", table_name)))?;
        Ok(table.get_schema().columns.clone())
    }

    fn engine(&self) -> Result<MutexGuard<'_, QueryExecutor>> {
        self.engine
            .lock()
            .map_err(|_| Error::Execution("engine lock poisoned".to_string()))
    }

    /// Next `<prefix>_<n>` not already taken by an explicitly named import
    fn next_sequential_name(&self, engine: &QueryExecutor) -> String {
        loop {
            let n = self.next_table.fetch_add(1, Ordering::Relaxed) + 1;
            let name = format!("{}_{}", self.config.table_prefix, n);
            if engine.get_table(&name).is_none() {
                return name;
            }
        }
    }
}

fn kind_matches(kind: StatementKind, query: &Query) -> bool {
    matches!(
        (kind, query),
        (StatementKind::Read, Query::Select { .. })
            | (StatementKind::Write(WriteKind::Insert), Query::Insert { .. })
            | (StatementKind::Write(WriteKind::Update), Query::Update { .. })
            | (StatementKind::Write(WriteKind::Delete), Query::Delete { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Rejection;

    fn service() -> CsvSql {
        CsvSql::new(Config::default()).unwrap()
    }

    fn import(svc: &CsvSql, csv: &str) -> ImportSummary {
        svc.import(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_import_summary() {
        let svc = service();
        let summary = import(&svc, "id,price,name,active\n1,2.5,apple,true\n2,3,pear,false\n");
        assert_eq!(summary.table_name, "csv_table_1");
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.columns, 4);
        assert_eq!(
            summary.column_types,
            vec![
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Text,
                ColumnType::Boolean
            ]
        );
    }

    #[test]
    fn test_imports_get_distinct_tables() {
        let svc = service();
        let first = import(&svc, "a\n1\n");
        let second = import(&svc, "b\nx\n");
        assert_ne!(first.table_name, second.table_name);
        assert_eq!(svc.list_tables().unwrap(), vec!["csv_table_1", "csv_table_2"]);
        assert_eq!(svc.export("csv_table_1").unwrap(), b"a\n1\n");
    }

    #[test]
    fn test_sequential_names_skip_taken_ones() {
        let svc = service();
        svc.import_as("a\n1\n".as_bytes(), "csv_table_1").unwrap();
        assert_eq!(import(&svc, "a\n2\n").table_name, "csv_table_2");
    }

    #[test]
    fn test_content_hash_naming_replaces_same_file() {
        let svc = CsvSql::new(Config {
            table_naming: TableNaming::ContentHash,
            ..Config::default()
        })
        .unwrap();
        let first = import(&svc, "a\n1\n");
        let again = import(&svc, "a\n1\n");
        let other = import(&svc, "a\n2\n");
        assert_eq!(first.table_name, again.table_name);
        assert_ne!(first.table_name, other.table_name);
        assert!(first.table_name.starts_with("csv_table_"));
        assert_eq!(svc.list_tables().unwrap().len(), 2);
        assert_eq!(svc.export(&first.table_name).unwrap(), b"a\n1\n");
    }

    #[test]
    fn test_import_as_replaces_table() {
        let svc = service();
        svc.import_as("a,b\n1,2\n".as_bytes(), "data").unwrap();
        svc.import_as("c\nx\n".as_bytes(), "data").unwrap();
        assert_eq!(svc.export("data").unwrap(), b"c\nx\n");
        assert!(svc.import_as("a\n1\n".as_bytes(), "  ").is_err());
    }

    #[test]
    fn test_ragged_row_stores_null() {
        let svc = service();
        let summary = import(&svc, "a,b\n1\n");
        assert_eq!(summary.column_types, vec![ColumnType::Integer, ColumnType::Text]);
        let result = svc
            .execute(&format!("SELECT * FROM {} WHERE b IS NULL", summary.table_name))
            .unwrap();
        assert_eq!(result.row_count(), 1);
        assert_eq!(svc.export(&summary.table_name).unwrap(), b"a,b\n1,\n");
    }

    #[test]
    fn test_execute_read_and_write() {
        let svc = service();
        let t = import(&svc, "id,name\n1,a\n2,b\n3,c\n").table_name;

        let result = svc.execute(&format!("SELECT name FROM {} WHERE id >= 2", t)).unwrap();
        let records = result.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&Value::Text("b".into())));

        let result = svc
            .execute(&format!("insert into {} values (4, 'd'), (5, 'e')", t))
            .unwrap();
        assert_eq!(
            result,
            QueryResult::Write {
                kind: WriteKind::Insert,
                affected: 2
            }
        );

        let result = svc
            .execute(&format!("UPDATE {} SET name = 'z' WHERE id > 3", t))
            .unwrap();
        assert_eq!(
            result,
            QueryResult::Write {
                kind: WriteKind::Update,
                affected: 2
            }
        );

        let result = svc.execute(&format!("DELETE FROM {} WHERE name = 'z'", t)).unwrap();
        assert_eq!(
            result,
            QueryResult::Write {
                kind: WriteKind::Delete,
                affected: 2
            }
        );
    }

    #[test]
    fn test_rejections_and_unsupported() {
        let svc = service();
        let t = import(&svc, "id\n1\n").table_name;

        assert!(matches!(
            svc.execute(&format!("DELETE FROM {}", t)),
            Err(Error::Rejected(Rejection::UnqualifiedDelete))
        ));
        assert!(matches!(
            svc.execute("   "),
            Err(Error::Rejected(Rejection::EmptyQuery))
        ));
        assert!(matches!(
            svc.execute(&format!("DROP TABLE {}", t)),
            Err(Error::Rejected(Rejection::ForbiddenOperation { keyword: "drop" }))
        ));
        match svc.execute("CREATE TABLE x (a INT)") {
            Err(Error::UnsupportedStatement(keyword)) => assert_eq!(keyword, "CREATE"),
            other => panic!("expected unsupported statement, got {:?}", other),
        }
        // Nothing was touched
        assert_eq!(svc.execute(&format!("SELECT * FROM {}", t)).unwrap().row_count(), 1);
    }

    #[test]
    fn test_strict_policy_blocks_unqualified_update() {
        let svc = CsvSql::new(Config {
            reject_unqualified_update: true,
            ..Config::default()
        })
        .unwrap();
        let t = import(&svc, "id\n1\n").table_name;
        assert!(matches!(
            svc.execute(&format!("UPDATE {} SET id = 2", t)),
            Err(Error::Rejected(Rejection::UnqualifiedUpdate))
        ));
        assert!(service().execute("UPDATE t SET id = 2").is_err());
    }

    #[test]
    fn test_engine_errors_surface_as_execution() {
        let svc = service();
        match svc.execute("SELECT * FROM missing_table") {
            Err(Error::Execution(message)) => assert!(message.contains("missing_table")),
            other => panic!("expected execution error, got {:?}", other),
        }
        assert!(matches!(
            svc.execute("SELECT * FROM"),
            Err(Error::Execution(_))
        ));
        assert!(matches!(svc.export("missing_table"), Err(Error::Execution(_))));
    }

    #[test]
    fn test_oversized_text_fails_import() {
        let svc = CsvSql::new(Config {
            text_length: 3,
            ..Config::default()
        })
        .unwrap();
        let err = svc.import("name\nabcd\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Execution(ref m) if m.contains("Value too long")));
        // The table was created before the insert failed
        assert_eq!(svc.list_tables().unwrap(), vec!["csv_table_1"]);
    }

    #[test]
    fn test_export_file_hints() {
        let svc = service();
        svc.import_as("a\n1\n".as_bytes(), "people").unwrap();
        let file = svc.export_file("people").unwrap();
        assert_eq!(file.filename, "people.csv");
        assert_eq!(file.content_type, "text/csv");
        assert_eq!(file.bytes, b"a\n1\n");
    }

    #[test]
    fn test_describe_reports_engine_columns() {
        let svc = service();
        svc.import_as("id,name\n1,x\n".as_bytes(), "t").unwrap();
        let columns = svc.describe("t").unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].max_length, Some(255));
        assert!(svc.describe("nope").is_err());
    }
}
