//! Typed records and datasets.
//!
//! A [`Dataset`] is an ordered column list plus ordered [`Record`]s. Every
//! record carries exactly one [`Value`] per column and remembers the source
//! line it was read from, so rejected rows can be traced back to the input.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CleanseError, Result};

/// A single typed cell.
///
/// Numeric variants are only produced when the number renders back to the
/// exact source text, so writing a dataset never changes untouched cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value.
    Null,
    /// Whole number.
    Integer(i64),
    /// Finite floating point number.
    Float(f64),
    /// Anything else.
    Text(String),
}

impl Value {
    /// Type a non-null cell from its source text.
    pub fn from_text(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            if n.to_string() == raw {
                return Value::Integer(n);
            }
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() && f.to_string() == raw {
                return Value::Float(f);
            }
        }
        Value::Text(raw.to_string())
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Integer code carried by this value, if it is a whole number.
    ///
    /// Integral floats count, so `1.0` carries the same code as `1`.
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            _ => None,
        }
    }

    /// Text content, for text values only.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

/// One row of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    line: usize,
    values: Vec<Value>,
}

impl Record {
    /// Create a record read from the given 1-based source line.
    pub fn new(line: usize, values: Vec<Value>) -> Self {
        Self { line, values }
    }

    /// Source line this record was read from.
    pub fn line(&self) -> usize {
        self.line
    }

    /// All fields in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Field at a column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Replace the field at a column position, returning the previous value.
    pub fn set(&mut self, index: usize, value: Value) -> Option<Value> {
        self.values
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every field is null.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }

    /// Fields rendered as text, nulls as empty strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.values.iter().map(|v| v.to_string()).collect()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }
}

/// Ordered records sharing one column list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Create an empty dataset with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    /// Create a dataset, checking that every record matches the column count.
    pub fn with_records(columns: Vec<String>, records: Vec<Record>) -> Result<Self> {
        let mut dataset = Self::new(columns);
        dataset.records.reserve(records.len());
        for record in records {
            dataset.push(record)?;
        }
        Ok(dataset)
    }

    /// Append a record.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if record.len() != self.columns.len() {
            return Err(CleanseError::FieldCount {
                line: record.line(),
                expected: self.columns.len(),
                found: record.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Records in order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Value of a named column in a record.
    pub fn value<'a>(&self, record: &'a Record, column: &str) -> Option<&'a Value> {
        self.column_index(column).and_then(|i| record.get(i))
    }

    /// Name-keyed view of a record, in column order.
    pub fn view<'a>(&'a self, record: &'a Record) -> IndexMap<&'a str, &'a Value> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(record.values())
            .collect()
    }

    /// Split into columns and records.
    pub fn into_parts(self) -> (Vec<String>, Vec<Record>) {
        (self.columns, self.records)
    }

    /// Rebuild from parts that came out of [`Dataset::into_parts`].
    pub(crate) fn from_parts(columns: Vec<String>, records: Vec<Record>) -> Self {
        debug_assert!(records.iter().all(|r| r.len() == columns.len()));
        Self { columns, records }
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [String] {
        &mut self.columns
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }
}
