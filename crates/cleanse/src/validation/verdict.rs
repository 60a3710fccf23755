//! Per-row validation outcomes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dataset::Value;

/// Outcome of checking one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Record is valid as is.
    Pass,
    /// Record is valid once `field` holds `value`.
    Rewrite { field: usize, value: Value },
    /// Record goes to quarantine.
    Reject { detail: String },
}

impl Verdict {
    pub fn reject(detail: impl Into<String>) -> Self {
        Verdict::Reject {
            detail: detail.into(),
        }
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject { .. })
    }
}

/// A validator could not reach a verdict for one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The record is narrower than the schema.
    #[error("record on line {line} has no field at position {field}")]
    MissingField { line: usize, field: usize },

    /// A column validator was called without a resolved column.
    #[error("{validator} needs a column position")]
    Unbound { validator: &'static str },
}

/// A row whose check failed; the row is kept unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub line: usize,
    pub stage: String,
    pub message: String,
}

/// A stage that could not run at all and passed its input through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: String,
    pub message: String,
}
