// Query Executor
// This module executes parsed queries against the in-process engine

use super::parser::{OrderKey, Query, SelectItem};
use super::predicate::row_filter;
use crate::storage::{table::Table, Row, Schema, Value};
use anyhow::{anyhow, Result};
use std::collections::HashMap;

/// Default number of rows stored per page
pub const DEFAULT_ROWS_PER_PAGE: usize = 100;

/// The query executor owns every table and executes queries against them
pub struct QueryExecutor {
    /// Tables keyed by lower-cased name; identifiers are case-insensitive
    tables: HashMap<String, Table>,
    rows_per_page: usize,
}

/// What the engine reports back for one executed query
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// CREATE TABLE succeeded
    Created { table_name: String },
    /// SELECT output, columns in projection order
    Rows { columns: Vec<String>, rows: Vec<Row> },
    /// INSERT / UPDATE / DELETE row count
    Affected(usize),
}

impl QueryExecutor {
    /// Create a new query executor (empty database)
    pub fn new() -> Self {
        Self::with_rows_per_page(DEFAULT_ROWS_PER_PAGE)
    }

    pub fn with_rows_per_page(rows_per_page: usize) -> Self {
        Self {
            tables: HashMap::new(),
            rows_per_page,
        }
    }

    /// Execute a query and return the outcome
    pub fn execute(&mut self, query: Query) -> Result<ExecOutcome> {
        match query {
            Query::CreateTable { name, schema } => {
                let key = name.to_ascii_lowercase();
                if self.tables.contains_key(&key) {
                    return Err(anyhow!("Table '{}' already exists", name));
                }

                let table = Table::new(name.clone(), schema, self.rows_per_page);
                self.tables.insert(key, table);

                Ok(ExecOutcome::Created { table_name: name })
            }

            Query::Insert {
                table_name,
                columns,
                rows,
            } => {
                let table = self.table_mut(&table_name)?;
                let positions = match &columns {
                    Some(names) => Some(insert_positions(table.get_schema(), names)?),
                    None => None,
                };
                let width = table.get_schema().columns.len();

                let mut inserted = 0;
                for values in rows {
                    let values = match &positions {
                        Some(positions) => spread_values(width, positions, values)?,
                        None => values,
                    };
                    table.insert(values)?;
                    inserted += 1;
                }

                Ok(ExecOutcome::Affected(inserted))
            }

            Query::Select {
                table_name,
                projection,
                where_clause,
                order_by,
                limit,
                offset,
            } => {
                let table = self.table(&table_name)?;
                let schema = table.get_schema();

                let outputs = resolve_projection(schema, &projection)?;
                let sort_keys = resolve_order(schema, &order_by)?;
                let filter = row_filter(where_clause.as_ref(), schema)?;

                let mut rows = table.select(filter);

                if !sort_keys.is_empty() {
                    rows.sort_by(|a, b| {
                        sort_keys
                            .iter()
                            .map(|&(index, ascending)| {
                                let ordering = a.values[index].sort_cmp(&b.values[index]);
                                if ascending {
                                    ordering
                                } else {
                                    ordering.reverse()
                                }
                            })
                            .find(|o| o.is_ne())
                            .unwrap_or(std::cmp::Ordering::Equal)
                    });
                }

                let rows = rows
                    .into_iter()
                    .skip(offset)
                    .take(limit.unwrap_or(usize::MAX))
                    .map(|row| Row {
                        values: outputs
                            .iter()
                            .map(|(index, _)| row.values[*index].clone())
                            .collect(),
                    })
                    .collect();

                Ok(ExecOutcome::Rows {
                    columns: outputs.into_iter().map(|(_, label)| label).collect(),
                    rows,
                })
            }

            Query::Update {
                table_name,
                assignments,
                where_clause,
            } => {
                let table = self.table_mut(&table_name)?;
                let schema = table.get_schema();

                let assignments = assignments
                    .into_iter()
                    .map(|(column, value)| {
                        schema
                            .get_column_index(&column)
                            .map(|index| (index, value))
                            .ok_or_else(|| anyhow!("Column not found: {}", column))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let filter = row_filter(where_clause.as_ref(), schema)?;

                let count = table.update(filter, assignments)?;
                Ok(ExecOutcome::Affected(count))
            }

            Query::Delete {
                table_name,
                where_clause,
            } => {
                let table = self.table_mut(&table_name)?;
                let filter = row_filter(where_clause.as_ref(), table.get_schema())?;

                Ok(ExecOutcome::Affected(table.delete(filter)))
            }
        }
    }

    /// Remove a table; returns whether it existed
    pub fn drop_table(&mut self, name: &str) -> bool {
        self.tables.remove(&name.to_ascii_lowercase()).is_some()
    }

    /// Get a reference to a table (useful for direct access)
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_ascii_lowercase())
    }

    /// List all tables in the database, sorted by name
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.values().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    fn table(&self, name: &str) -> Result<&Table> {
        self.get_table(name)
            .ok_or_else(|| anyhow!("Table '{}' not found", name))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| anyhow!("Table '{}' not found", name))
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema positions for an explicit INSERT column list
fn insert_positions(schema: &Schema, names: &[String]) -> Result<Vec<usize>> {
    let mut positions = Vec::with_capacity(names.len());
    for name in names {
        let index = schema
            .get_column_index(name)
            .ok_or_else(|| anyhow!("Column not found: {}", name))?;
        if positions.contains(&index) {
            return Err(anyhow!("Column '{}' specified more than once", name));
        }
        positions.push(index);
    }
    Ok(positions)
}

/// Place listed values at their positions; unlisted columns are NULL
fn spread_values(width: usize, positions: &[usize], values: Vec<Value>) -> Result<Vec<Value>> {
    if values.len() != positions.len() {
        return Err(anyhow!(
            "Expected {} values, got {}",
            positions.len(),
            values.len()
        ));
    }

    let mut row = vec![Value::Null; width];
    for (&index, value) in positions.iter().zip(values) {
        row[index] = value;
    }
    Ok(row)
}

/// (schema position, output label) for each projected column
fn resolve_projection(schema: &Schema, items: &[SelectItem]) -> Result<Vec<(usize, String)>> {
    let mut outputs = Vec::new();
    for item in items {
        match item {
            SelectItem::Wildcard => outputs.extend(
                schema
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, c.name.clone())),
            ),
            SelectItem::Column { name, alias } => {
                let index = schema
                    .get_column_index(name)
                    .ok_or_else(|| anyhow!("Column not found: {}", name))?;
                let label = alias
                    .clone()
                    .unwrap_or_else(|| schema.columns[index].name.clone());
                outputs.push((index, label));
            }
        }
    }
    Ok(outputs)
}

fn resolve_order(schema: &Schema, keys: &[OrderKey]) -> Result<Vec<(usize, bool)>> {
    keys.iter()
        .map(|key| {
            schema
                .get_column_index(&key.column)
                .map(|index| (index, key.ascending))
                .ok_or_else(|| anyhow!("Column not found: {}", key.column))
        })
        .collect()
}
