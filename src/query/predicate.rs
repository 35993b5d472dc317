// WHERE clause predicates
// The parser produces predicates over column names; before evaluation they
// are bound to a schema so every column reference becomes a position

use crate::storage::{Column, DataType, Row, Schema, Value};
use anyhow::{anyhow, Result};
use std::cmp::Ordering;

/// Comparison operators supported between a column and a literal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    /// The operator seen from the other side: `5 < col` is `col > 5`
    pub fn flip(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::LtEq => CompareOp::GtEq,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::GtEq => CompareOp::LtEq,
            other => other,
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::NotEq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::LtEq => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::GtEq => ordering != Ordering::Less,
        }
    }
}

/// A WHERE clause as parsed, referring to columns by name
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// A predicate whose column references were resolved against a schema
#[derive(Debug, Clone)]
pub enum BoundPredicate {
    Compare {
        index: usize,
        op: CompareOp,
        value: Value,
    },
    IsNull {
        index: usize,
        negated: bool,
    },
    And(Box<BoundPredicate>, Box<BoundPredicate>),
    Or(Box<BoundPredicate>, Box<BoundPredicate>),
    Not(Box<BoundPredicate>),
}

impl Predicate {
    /// Resolve column names; unknown columns are an error
    pub fn bind(&self, schema: &Schema) -> Result<BoundPredicate> {
        let resolve = |column: &str| {
            schema
                .get_column_index(column)
                .ok_or_else(|| anyhow!("Column not found: {}", column))
        };

        Ok(match self {
            Predicate::Compare { column, op, value } => {
                let index = resolve(column)?;
                BoundPredicate::Compare {
                    index,
                    op: *op,
                    value: bind_literal(&schema.columns[index], value)?,
                }
            }
            Predicate::IsNull { column, negated } => BoundPredicate::IsNull {
                index: resolve(column)?,
                negated: *negated,
            },
            Predicate::And(l, r) => BoundPredicate::And(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?)),
            Predicate::Or(l, r) => BoundPredicate::Or(Box::new(l.bind(schema)?), Box::new(r.bind(schema)?)),
            Predicate::Not(inner) => BoundPredicate::Not(Box::new(inner.bind(schema)?)),
        })
    }
}

/// Quoted literals compared with a non-TEXT column take the column's type
fn bind_literal(column: &Column, value: &Value) -> Result<Value> {
    match (column.data_type, value) {
        (DataType::Text, _) => Ok(value.clone()),
        (_, Value::Text(_)) => column.coerce(value.clone()),
        _ => Ok(value.clone()),
    }
}

impl BoundPredicate {
    /// Evaluate against a row. Comparisons involving NULL or incomparable
    /// types are false
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            BoundPredicate::Compare { index, op, value } => row
                .values
                .get(*index)
                .and_then(|cell| cell.compare(value))
                .is_some_and(|ordering| op.holds(ordering)),
            BoundPredicate::IsNull { index, negated } => {
                let is_null = row.values.get(*index).map_or(true, Value::is_null);
                is_null != *negated
            }
            BoundPredicate::And(l, r) => l.matches(row) && r.matches(row),
            BoundPredicate::Or(l, r) => l.matches(row) || r.matches(row),
            BoundPredicate::Not(inner) => !inner.matches(row),
        }
    }
}

/// Bind an optional predicate into a row filter; no predicate matches everything
pub fn row_filter(predicate: Option<&Predicate>, schema: &Schema) -> Result<impl Fn(&Row) -> bool> {
    let bound = predicate.map(|p| p.bind(schema)).transpose()?;
    Ok(move |row: &Row| bound.as_ref().map_or(true, |p| p.matches(row)))
}
