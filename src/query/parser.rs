// SQL Parser
// This module converts SQL strings into structured queries
// We use the sqlparser crate to handle the SQL grammar and keep only the
// subset the engine can execute

use super::predicate::{CompareOp, Predicate};
use crate::storage::{Column, DataType, Schema, Value};
use anyhow::{anyhow, Result};
use sqlparser::ast::{
    AssignmentTarget, BinaryOperator, CharacterLength, ColumnOption, DataType as SqlDataType,
    Expr, FromTable, ObjectName, Offset, OrderByExpr, Select, SelectItem as SqlSelectItem,
    SetExpr, Statement, TableFactor, TableWithJoins, UnaryOperator, Value as SqlValue,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Represents the different types of queries we support
#[derive(Debug, Clone)]
pub enum Query {
    /// CREATE TABLE tablename (col1 TYPE, col2 TYPE, ...)
    CreateTable { name: String, schema: Schema },
    /// INSERT INTO tablename [(cols)] VALUES (...), (...)
    Insert {
        table_name: String,
        columns: Option<Vec<String>>,
        rows: Vec<Vec<Value>>,
    },
    /// SELECT items FROM tablename [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET n]
    Select {
        table_name: String,
        projection: Vec<SelectItem>,
        where_clause: Option<Predicate>,
        order_by: Vec<OrderKey>,
        limit: Option<usize>,
        offset: usize,
    },
    /// UPDATE tablename SET col = value, ... [WHERE ...]
    Update {
        table_name: String,
        assignments: Vec<(String, Value)>,
        where_clause: Option<Predicate>,
    },
    /// DELETE FROM tablename [WHERE ...]
    Delete {
        table_name: String,
        where_clause: Option<Predicate>,
    },
}

/// One entry of a SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Wildcard,
    Column { name: String, alias: Option<String> },
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub column: String,
    pub ascending: bool,
}

impl Query {
    /// `SELECT * FROM table` without going through SQL text
    pub fn select_all(table_name: impl Into<String>) -> Self {
        Query::Select {
            table_name: table_name.into(),
            projection: vec![SelectItem::Wildcard],
            where_clause: None,
            order_by: Vec::new(),
            limit: None,
            offset: 0,
        }
    }
}

/// The query parser
pub struct QueryParser;

impl QueryParser {
    /// Parse a SQL string into a Query
    pub fn parse(sql: &str) -> Result<Query> {
        let dialect = GenericDialect {};
        let ast = Parser::parse_sql(&dialect, sql)
            .map_err(|e| anyhow!("SQL parsing error: {}", e))?;

        // We only support single statements
        if ast.len() != 1 {
            return Err(anyhow!("Only single statements are supported"));
        }

        match &ast[0] {
            Statement::CreateTable(create_table) => Self::parse_create_table(create_table),
            Statement::Insert(insert) => Self::parse_insert(insert),
            Statement::Query(query) => Self::parse_select(query),
            Statement::Update {
                table,
                assignments,
                selection,
                ..
            } => Self::parse_update(table, assignments, selection),
            Statement::Delete(delete) => Self::parse_delete(delete),
            _ => Err(anyhow!("Unsupported SQL statement")),
        }
    }

    /// Parse CREATE TABLE statement
    fn parse_create_table(create_table: &sqlparser::ast::CreateTable) -> Result<Query> {
        let table_name = object_name(&create_table.name);
        if create_table.columns.is_empty() {
            return Err(anyhow!("Table '{}' must have at least one column", table_name));
        }

        let mut columns: Vec<Column> = Vec::new();

        for column_def in &create_table.columns {
            let name = column_def.name.value.clone();
            if columns.iter().any(|c| c.name.eq_ignore_ascii_case(&name)) {
                return Err(anyhow!("Duplicate column name: {}", name));
            }

            let (data_type, max_length) = Self::parse_data_type(&column_def.data_type)?;

            let primary_key = column_def.options.iter().any(|opt| {
                matches!(opt.option, ColumnOption::Unique { is_primary: true, .. })
            });

            let not_null = column_def
                .options
                .iter()
                .any(|opt| matches!(opt.option, ColumnOption::NotNull));

            columns.push(Column {
                name,
                data_type,
                primary_key,
                nullable: !(not_null || primary_key),
                max_length,
            });
        }

        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(anyhow!("Only one PRIMARY KEY column is supported"));
        }

        Ok(Query::CreateTable {
            name: table_name,
            schema: Schema::new(columns),
        })
    }

    /// Parse INSERT statement
    fn parse_insert(insert: &sqlparser::ast::Insert) -> Result<Query> {
        let table_name = object_name(&insert.table_name);

        let columns = if insert.columns.is_empty() {
            None
        } else {
            Some(insert.columns.iter().map(|c| c.value.clone()).collect())
        };

        let rows = match &insert.source {
            Some(source) => match source.body.as_ref() {
                SetExpr::Values(values) => values
                    .rows
                    .iter()
                    .map(|row| row.iter().map(Self::parse_value).collect())
                    .collect::<Result<Vec<Vec<Value>>>>()?,
                _ => return Err(anyhow!("Unsupported INSERT format")),
            },
            None => return Err(anyhow!("No values provided")),
        };

        if rows.is_empty() {
            return Err(anyhow!("No values provided"));
        }

        Ok(Query::Insert {
            table_name,
            columns,
            rows,
        })
    }

    /// Parse SELECT statement
    fn parse_select(query: &sqlparser::ast::Query) -> Result<Query> {
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            _ => return Err(anyhow!("Unsupported SELECT format")),
        };

        if select.distinct.is_some() {
            return Err(anyhow!("SELECT DISTINCT is not supported"));
        }

        let table_name = Self::extract_table_name(select)?;

        let projection = select
            .projection
            .iter()
            .map(Self::parse_select_item)
            .collect::<Result<Vec<_>>>()?;

        let where_clause = select
            .selection
            .as_ref()
            .map(Self::parse_predicate)
            .transpose()?;

        let order_by = match &query.order_by {
            Some(order_by) => order_by
                .exprs
                .iter()
                .map(Self::parse_order_key)
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        let limit = query.limit.as_ref().map(Self::parse_count).transpose()?;
        let offset = match &query.offset {
            Some(Offset { value, .. }) => Self::parse_count(value)?,
            None => 0,
        };

        Ok(Query::Select {
            table_name,
            projection,
            where_clause,
            order_by,
            limit,
            offset,
        })
    }

    /// Parse UPDATE statement
    fn parse_update(
        table: &TableWithJoins,
        assignments: &[sqlparser::ast::Assignment],
        selection: &Option<Expr>,
    ) -> Result<Query> {
        let table_name = Self::table_with_joins_name(table)?;

        if assignments.is_empty() {
            return Err(anyhow!("UPDATE requires at least one assignment"));
        }

        let assignments = assignments
            .iter()
            .map(|assignment| -> Result<(String, Value)> {
                let column = match &assignment.target {
                    AssignmentTarget::ColumnName(name) => last_ident(name)?,
                    _ => return Err(anyhow!("Unsupported assignment target")),
                };
                Ok((column, Self::parse_value(&assignment.value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let where_clause = selection.as_ref().map(Self::parse_predicate).transpose()?;

        Ok(Query::Update {
            table_name,
            assignments,
            where_clause,
        })
    }

    /// Parse DELETE statement
    fn parse_delete(delete: &sqlparser::ast::Delete) -> Result<Query> {
        let from = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };

        let table_name = match (from.as_slice(), delete.tables.first()) {
            ([table], _) => Self::table_with_joins_name(table)?,
            ([], Some(name)) => object_name(name),
            ([], None) => return Err(anyhow!("No table specified")),
            _ => return Err(anyhow!("DELETE from multiple tables is not supported")),
        };

        let where_clause = delete
            .selection
            .as_ref()
            .map(Self::parse_predicate)
            .transpose()?;

        Ok(Query::Delete {
            table_name,
            where_clause,
        })
    }

    /// Helper: Parse data type into the engine type plus an optional length bound
    fn parse_data_type(sql_type: &SqlDataType) -> Result<(DataType, Option<usize>)> {
        match sql_type {
            SqlDataType::Int(_)
            | SqlDataType::Integer(_)
            | SqlDataType::BigInt(_)
            | SqlDataType::SmallInt(_)
            | SqlDataType::TinyInt(_)
            | SqlDataType::Int64 => Ok((DataType::Integer, None)),
            SqlDataType::Float(_)
            | SqlDataType::Double
            | SqlDataType::DoublePrecision
            | SqlDataType::Real
            | SqlDataType::Float64 => Ok((DataType::Float, None)),
            SqlDataType::Varchar(length) | SqlDataType::CharVarying(length) => {
                let max_length = match length {
                    Some(CharacterLength::IntegerLength { length, .. }) => Some(*length as usize),
                    Some(CharacterLength::Max) | None => None,
                };
                Ok((DataType::Text, max_length))
            }
            SqlDataType::Text | SqlDataType::String(_) => Ok((DataType::Text, None)),
            SqlDataType::Boolean | SqlDataType::Bool => Ok((DataType::Boolean, None)),
            _ => Err(anyhow!("Unsupported data type: {}", sql_type)),
        }
    }

    /// Helper: Parse a single SQL literal
    fn parse_value(expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Value(SqlValue::Number(n, _)) => {
                if n.contains(['.', 'e', 'E']) {
                    Ok(Value::Float(n.parse()?))
                } else {
                    n.parse::<i64>()
                        .map(Value::Integer)
                        .map_err(|_| anyhow!("Integer literal out of range: {}", n))
                }
            }
            Expr::Value(SqlValue::SingleQuotedString(s)) => Ok(Value::Text(s.clone())),
            Expr::Value(SqlValue::Boolean(b)) => Ok(Value::Boolean(*b)),
            Expr::Value(SqlValue::Null) => Ok(Value::Null),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr,
            } => match Self::parse_value(expr)? {
                Value::Integer(i) => Ok(Value::Integer(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(anyhow!("Cannot negate {:?}", other)),
            },
            Expr::UnaryOp {
                op: UnaryOperator::Plus,
                expr,
            } => Self::parse_value(expr),
            Expr::Nested(inner) => Self::parse_value(inner),
            _ => Err(anyhow!("Unsupported value expression: {}", expr)),
        }
    }

    /// Helper: Parse a non-negative count for LIMIT / OFFSET
    fn parse_count(expr: &Expr) -> Result<usize> {
        match Self::parse_value(expr)? {
            Value::Integer(n) if n >= 0 => Ok(n as usize),
            _ => Err(anyhow!("Expected a non-negative integer, got {}", expr)),
        }
    }

    fn parse_select_item(item: &SqlSelectItem) -> Result<SelectItem> {
        match item {
            SqlSelectItem::Wildcard(_) => Ok(SelectItem::Wildcard),
            SqlSelectItem::UnnamedExpr(expr) => Ok(SelectItem::Column {
                name: column_name(expr)?,
                alias: None,
            }),
            SqlSelectItem::ExprWithAlias { expr, alias } => Ok(SelectItem::Column {
                name: column_name(expr)?,
                alias: Some(alias.value.clone()),
            }),
            _ => Err(anyhow!("Unsupported select item: {}", item)),
        }
    }

    fn parse_order_key(expr: &OrderByExpr) -> Result<OrderKey> {
        Ok(OrderKey {
            column: column_name(&expr.expr)?,
            ascending: expr.asc.unwrap_or(true),
        })
    }

    /// Helper: Extract table name from SELECT
    fn extract_table_name(select: &Select) -> Result<String> {
        match select.from.as_slice() {
            [] => Err(anyhow!("No table specified in SELECT")),
            [table] => Self::table_with_joins_name(table),
            _ => Err(anyhow!("Selecting from multiple tables is not supported")),
        }
    }

    fn table_with_joins_name(table: &TableWithJoins) -> Result<String> {
        if !table.joins.is_empty() {
            return Err(anyhow!("JOIN is not supported"));
        }
        match &table.relation {
            TableFactor::Table { name, .. } => Ok(object_name(name)),
            _ => Err(anyhow!("Unsupported table reference")),
        }
    }

    /// Helper: Parse a WHERE clause into a predicate tree
    fn parse_predicate(expr: &Expr) -> Result<Predicate> {
        match expr {
            Expr::Nested(inner) => Self::parse_predicate(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr,
            } => Ok(Predicate::Not(Box::new(Self::parse_predicate(expr)?))),
            Expr::IsNull(inner) => Ok(Predicate::IsNull {
                column: column_name(inner)?,
                negated: false,
            }),
            Expr::IsNotNull(inner) => Ok(Predicate::IsNull {
                column: column_name(inner)?,
                negated: true,
            }),
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => Ok(Predicate::And(
                    Box::new(Self::parse_predicate(left)?),
                    Box::new(Self::parse_predicate(right)?),
                )),
                BinaryOperator::Or => Ok(Predicate::Or(
                    Box::new(Self::parse_predicate(left)?),
                    Box::new(Self::parse_predicate(right)?),
                )),
                _ => {
                    let op = compare_op(op)?;
                    // Either side may hold the column
                    match (column_name(left), column_name(right)) {
                        (Ok(column), _) => Ok(Predicate::Compare {
                            column,
                            op,
                            value: Self::parse_value(right)?,
                        }),
                        (Err(_), Ok(column)) => Ok(Predicate::Compare {
                            column,
                            op: op.flip(),
                            value: Self::parse_value(left)?,
                        }),
                        (Err(e), Err(_)) => Err(e),
                    }
                }
            },
            _ => Err(anyhow!("Unsupported WHERE clause: {}", expr)),
        }
    }
}

fn compare_op(op: &BinaryOperator) -> Result<CompareOp> {
    match op {
        BinaryOperator::Eq => Ok(CompareOp::Eq),
        BinaryOperator::NotEq => Ok(CompareOp::NotEq),
        BinaryOperator::Lt => Ok(CompareOp::Lt),
        BinaryOperator::LtEq => Ok(CompareOp::LtEq),
        BinaryOperator::Gt => Ok(CompareOp::Gt),
        BinaryOperator::GtEq => Ok(CompareOp::GtEq),
        other => Err(anyhow!("Unsupported operator in WHERE clause: {}", other)),
    }
}

/// Column reference; a qualified `t.col` resolves to `col`
fn column_name(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Identifier(ident) => Ok(ident.value.clone()),
        Expr::CompoundIdentifier(idents) => idents
            .last()
            .map(|i| i.value.clone())
            .ok_or_else(|| anyhow!("Empty column reference")),
        Expr::Nested(inner) => column_name(inner),
        _ => Err(anyhow!("Expected column name, got {}", expr)),
    }
}

fn object_name(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|i| i.value.clone())
        .collect::<Vec<_>>()
        .join(".")
}

fn last_ident(name: &ObjectName) -> Result<String> {
    name.0
        .last()
        .map(|i| i.value.clone())
        .ok_or_else(|| anyhow!("Empty column name"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_table_with_bounds() {
        let query = QueryParser::parse(
            r#"CREATE TABLE t ("id" BIGINT PRIMARY KEY, "name" VARCHAR(255), "score" DOUBLE, "ok" BOOLEAN)"#,
        )
        .unwrap();
        match query {
            Query::CreateTable { name, schema } => {
                assert_eq!(name, "t");
                assert_eq!(schema.column_names(), vec!["id", "name", "score", "ok"]);
                assert!(schema.columns[0].primary_key);
                assert!(!schema.columns[0].nullable);
                assert_eq!(schema.columns[1].data_type, DataType::Text);
                assert_eq!(schema.columns[1].max_length, Some(255));
                assert_eq!(schema.columns[2].data_type, DataType::Float);
                assert_eq!(schema.columns[3].data_type, DataType::Boolean);
            }
            other => panic!("unexpected query: {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_table_rejects_duplicate_columns() {
        assert!(QueryParser::parse("CREATE TABLE t (a INT, A INT)").is_err());
    }

    #[test]
    fn test_parse_multi_row_insert() {
        let query =
            QueryParser::parse("INSERT INTO t (a, b) VALUES (1, 'x'), (-2, NULL)").unwrap();
        match query {
            Query::Insert {
                table_name,
                columns,
                rows,
            } => {
                assert_eq!(table_name, "t");
                assert_eq!(columns, Some(vec!["a".to_string(), "b".to_string()]));
                assert_eq!(
                    rows,
                    vec![
                        vec![Value::Integer(1), Value::Text("x".into())],
                        vec![Value::Integer(-2), Value::Null],
                    ]
                );
            }
            other => panic!("unexpected query: {:?}", other),
        }
    }

    #[test]
    fn test_parse_select_clauses() {
        let query = QueryParser::parse(
            "SELECT name AS n, age FROM users WHERE age >= 18 AND NOT name IS NULL ORDER BY age DESC LIMIT 10 OFFSET 5",
        )
        .unwrap();
        match query {
            Query::Select {
                table_name,
                projection,
                where_clause,
                order_by,
                limit,
                offset,
            } => {
                assert_eq!(table_name, "users");
                assert_eq!(
                    projection,
                    vec![
                        SelectItem::Column {
                            name: "name".into(),
                            alias: Some("n".into())
                        },
                        SelectItem::Column {
                            name: "age".into(),
                            alias: None
                        },
                    ]
                );
                assert!(matches!(where_clause, Some(Predicate::And(_, _))));
                assert_eq!(
                    order_by,
                    vec![OrderKey {
                        column: "age".into(),
                        ascending: false
                    }]
                );
                assert_eq!(limit, Some(10));
                assert_eq!(offset, 5);
            }
            other => panic!("unexpected query: {:?}", other),
        }
    }

    #[test]
    fn test_literal_on_left_flips_operator() {
        let query = QueryParser::parse("SELECT * FROM t WHERE 5 < a").unwrap();
        match query {
            Query::Select { where_clause, .. } => assert_eq!(
                where_clause,
                Some(Predicate::Compare {
                    column: "a".into(),
                    op: CompareOp::Gt,
                    value: Value::Integer(5)
                })
            ),
            other => panic!("unexpected query: {:?}", other),
        }
    }

    #[test]
    fn test_parse_update_and_delete_without_where() {
        match QueryParser::parse("UPDATE t SET a = 1, b = 'z'").unwrap() {
            Query::Update {
                assignments,
                where_clause,
                ..
            } => {
                assert_eq!(assignments.len(), 2);
                assert!(where_clause.is_none());
            }
            other => panic!("unexpected query: {:?}", other),
        }

        match QueryParser::parse("DELETE FROM t").unwrap() {
            Query::Delete {
                table_name,
                where_clause,
            } => {
                assert_eq!(table_name, "t");
                assert!(where_clause.is_none());
            }
            other => panic!("unexpected query: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unsupported_shapes() {
        assert!(QueryParser::parse("SELECT * FROM a JOIN b ON a.id = b.id").is_err());
        assert!(QueryParser::parse("SELECT * FROM t; SELECT * FROM t").is_err());
        assert!(QueryParser::parse("SELEC * FROM t").is_err());
        assert!(QueryParser::parse("SELECT * FROM t WHERE a LIKE 'x%'").is_err());
    }
}
