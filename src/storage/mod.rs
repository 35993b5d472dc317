// Storage module - the in-process relational engine's row store
// Tables keep their rows in pages; values are typed per column

pub mod page;
pub mod table;

use anyhow::{anyhow, Result};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Represents a single row in a table
/// Values are positional, aligned with the table's schema
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

/// A single cell value as the engine stores it
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Compare two values (used for WHERE clauses and ORDER BY)
    /// Integers and floats compare numerically; other mixed pairs are incomparable
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total ordering for sorting: NULLs first, incomparable pairs keep their order
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            // Whole floats keep a fractional digit so 3.0 does not read back as an integer
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

// Values serialize as plain JSON scalars rather than tagged enums
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

/// Represents the schema (structure) of a table
#[derive(Debug, Clone)]
pub struct Schema {
    pub columns: Vec<Column>,
}

/// Represents a single column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub nullable: bool,
    /// Character bound declared as VARCHAR(n); None means unbounded
    pub max_length: Option<usize>,
}

/// The data types the engine supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "INTEGER",
            DataType::Float => "FLOAT",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
        };
        f.write_str(name)
    }
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            nullable: true,
            max_length: None,
        }
    }

    /// Convert a value into this column's type, the way a loosely typed
    /// driver binds parameters: numeric and boolean text is accepted
    pub fn coerce(&self, value: Value) -> Result<Value> {
        let coerced = match (self.data_type, value) {
            (_, Value::Null) => {
                if !self.nullable {
                    return Err(anyhow!("NULL not allowed for column '{}'", self.name));
                }
                Value::Null
            }
            (DataType::Integer, Value::Integer(i)) => Value::Integer(i),
            (DataType::Integer, Value::Text(s)) => {
                let parsed = s.trim().parse::<i64>().map_err(|_| {
                    anyhow!("Cannot convert '{}' to INTEGER for column '{}'", s, self.name)
                })?;
                Value::Integer(parsed)
            }
            (DataType::Float, Value::Float(x)) => Value::Float(x),
            (DataType::Float, Value::Integer(i)) => Value::Float(i as f64),
            (DataType::Float, Value::Text(s)) => {
                let parsed = s.trim().parse::<f64>().map_err(|_| {
                    anyhow!("Cannot convert '{}' to FLOAT for column '{}'", s, self.name)
                })?;
                Value::Float(parsed)
            }
            (DataType::Boolean, Value::Boolean(b)) => Value::Boolean(b),
            (DataType::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => {
                    return Err(anyhow!(
                        "Cannot convert '{}' to BOOLEAN for column '{}'",
                        s,
                        self.name
                    ))
                }
            },
            (DataType::Text, Value::Text(s)) => Value::Text(s),
            (DataType::Text, other) => Value::Text(other.to_string()),
            (data_type, other) => {
                return Err(anyhow!(
                    "Type mismatch for column '{}': expected {}, got {:?}",
                    self.name,
                    data_type,
                    other
                ))
            }
        };

        if matches!(coerced, Value::Float(x) if !x.is_finite()) {
            return Err(anyhow!(
                "Non-finite value {} not allowed for column '{}'",
                coerced,
                self.name
            ));
        }

        if let (Some(max), Value::Text(s)) = (self.max_length, &coerced) {
            let len = s.chars().count();
            if len > max {
                return Err(anyhow!(
                    "Value too long for column '{}' (length {}, maximum {})",
                    self.name,
                    len,
                    max
                ));
            }
        }

        Ok(coerced)
    }
}

impl Schema {
    /// Create a new schema with the given columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Find the index of a column by name (identifiers are case-insensitive)
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|col| col.name.eq_ignore_ascii_case(name))
    }

    /// Get the primary key column index
    pub fn get_primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|col| col.primary_key)
    }

    /// Column names in declaration order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}
