// Table implementation
// A table combines a schema with page-based row storage

use super::{page::PageManager, Row, Schema, Value};
use anyhow::{anyhow, Result};

/// Represents a database table
pub struct Table {
    /// The name of the table
    pub name: String,
    /// The schema (column definitions)
    pub schema: Schema,
    /// Page-based storage for rows
    page_manager: PageManager,
}

impl Table {
    /// Create a new, empty table with the given name and schema
    pub fn new(name: String, schema: Schema, rows_per_page: usize) -> Self {
        Self {
            name,
            schema,
            page_manager: PageManager::new(rows_per_page),
        }
    }

    /// Insert a row into the table
    /// Values are coerced to the column types; returns the row ID
    pub fn insert(&mut self, values: Vec<Value>) -> Result<usize> {
        if values.len() != self.schema.columns.len() {
            return Err(anyhow!(
                "Expected {} values, got {}",
                self.schema.columns.len(),
                values.len()
            ));
        }

        let values = values
            .into_iter()
            .zip(&self.schema.columns)
            .map(|(value, column)| column.coerce(value))
            .collect::<Result<Vec<_>>>()?;

        // Primary key constraint (no duplicates)
        if let Some(pk_index) = self.schema.get_primary_key_index() {
            let pk_value = &values[pk_index];
            if self.contains_key(pk_index, pk_value, None) {
                return Err(anyhow!(
                    "Primary key violation: duplicate value {} in '{}'",
                    pk_value,
                    self.name
                ));
            }
        }

        Ok(self.page_manager.insert(Row { values }))
    }

    /// All live rows in insertion order
    pub fn scan(&self) -> Vec<&Row> {
        self.page_manager
            .scan()
            .into_iter()
            .map(|(_id, row)| row)
            .collect()
    }

    /// Rows for which the filter holds
    pub fn select<F>(&self, filter: F) -> Vec<Row>
    where
        F: Fn(&Row) -> bool,
    {
        self.page_manager
            .scan()
            .into_iter()
            .filter(|(_id, row)| filter(row))
            .map(|(_id, row)| row.clone())
            .collect()
    }

    /// Apply the assignments (column index, new value) to every matching row
    /// Returns the number of rows updated
    pub fn update<F>(&mut self, filter: F, assignments: Vec<(usize, Value)>) -> Result<usize>
    where
        F: Fn(&Row) -> bool,
    {
        let assignments = assignments
            .into_iter()
            .map(|(index, value)| {
                let column = self
                    .schema
                    .columns
                    .get(index)
                    .ok_or_else(|| anyhow!("Column index {} out of range", index))?;
                Ok((index, column.coerce(value)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let row_ids: Vec<usize> = self
            .page_manager
            .scan()
            .into_iter()
            .filter(|(_id, row)| filter(row))
            .map(|(id, _row)| id)
            .collect();

        if let Some(pk_index) = self.schema.get_primary_key_index() {
            if let Some((_, new_key)) = assignments.iter().find(|(i, _)| *i == pk_index) {
                let collides = row_ids.len() > 1
                    || row_ids
                        .first()
                        .is_some_and(|id| self.contains_key(pk_index, new_key, Some(*id)));
                if collides {
                    return Err(anyhow!(
                        "Primary key violation: duplicate value {} in '{}'",
                        new_key,
                        self.name
                    ));
                }
            }
        }

        for &row_id in &row_ids {
            if let Some(row) = self.page_manager.get_mut(row_id) {
                for (index, value) in &assignments {
                    row.values[*index] = value.clone();
                }
            }
        }

        Ok(row_ids.len())
    }

    /// Delete every matching row; returns the number of rows deleted
    pub fn delete<F>(&mut self, filter: F) -> usize
    where
        F: Fn(&Row) -> bool,
    {
        let row_ids: Vec<usize> = self
            .page_manager
            .scan()
            .into_iter()
            .filter(|(_id, row)| filter(row))
            .map(|(id, _row)| id)
            .collect();

        row_ids
            .into_iter()
            .filter_map(|id| self.page_manager.delete(id))
            .count()
    }

    /// Whether some row other than `except` holds `key` in column `index`
    fn contains_key(&self, index: usize, key: &Value, except: Option<usize>) -> bool {
        self.page_manager.scan().into_iter().any(|(id, row)| {
            Some(id) != except && row.values[index].compare(key) == Some(std::cmp::Ordering::Equal)
        })
    }

    /// Get the number of rows in the table
    pub fn row_count(&self) -> usize {
        self.page_manager.total_rows()
    }

    /// Get the schema of the table
    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }
}
