//! Schema normalization: column renames, categorical codes, required fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Dataset, Record, Value};
use crate::error::{CleanseError, Result};
use crate::quarantine::{DroppedRow, QuarantineRecord, RejectionReason};

const STAGE: &str = "schema_normalizer";

/// Which columns the categorical remap touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope", content = "column")]
pub enum RemapScope {
    /// Every column. Reproduces the legacy export cleaner, which also
    /// rewrote unrelated 0/1 values such as ids and flags.
    Global,
    /// A single column by canonical name.
    Column(String),
}

/// Mapping from integer codes to labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoricalRemap {
    pub scope: RemapScope,
    pub codes: IndexMap<i64, String>,
}

impl Default for CategoricalRemap {
    fn default() -> Self {
        let mut codes = IndexMap::new();
        codes.insert(0, "F".to_string());
        codes.insert(1, "M".to_string());
        Self {
            scope: RemapScope::Column("gender".to_string()),
            codes,
        }
    }
}

/// What happens to a record whose required field is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Remove it and list it in the run report.
    #[default]
    Drop,
    /// Send it to quarantine.
    Quarantine,
}

/// Normalizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerConfig {
    /// Raw column name to canonical name, applied in order.
    pub renames: IndexMap<String, String>,
    /// Categorical code remapping.
    pub categorical: CategoricalRemap,
    /// Canonical columns that must be non-null.
    pub required: Vec<String>,
    /// Handling of records missing a required field.
    pub missing_policy: MissingFieldPolicy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let mut renames = IndexMap::new();
        renames.insert("mail_address".to_string(), "email".to_string());
        renames.insert("birthday_on".to_string(), "date_of_birth".to_string());
        Self {
            renames,
            categorical: CategoricalRemap::default(),
            required: vec!["date_of_birth".to_string()],
            missing_policy: MissingFieldPolicy::Drop,
        }
    }
}

impl NormalizerConfig {
    /// Reject empty names.
    pub fn validate(&self) -> Result<()> {
        if let Some((from, to)) = self
            .renames
            .iter()
            .find(|(from, to)| from.is_empty() || to.is_empty())
        {
            return Err(CleanseError::Config(format!(
                "empty column name in rename '{}' -> '{}'",
                from, to
            )));
        }
        if let RemapScope::Column(column) = &self.categorical.scope {
            if column.is_empty() {
                return Err(CleanseError::Config(
                    "categorical remap column must not be empty".to_string(),
                ));
            }
        }
        if self.required.iter().any(String::is_empty) {
            return Err(CleanseError::Config(
                "required column names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of normalizing a dataset.
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Renamed and remapped records that have all required fields.
    pub dataset: Dataset,
    /// Records dropped for a missing required field.
    pub dropped: Vec<DroppedRow>,
    /// Records quarantined for a missing required field.
    pub quarantined: Vec<QuarantineRecord>,
    /// Number of cells rewritten by the categorical remap.
    pub remapped_cells: usize,
}

/// Renames columns to canonical names and cleans up coded values.
pub struct SchemaNormalizer {
    config: NormalizerConfig,
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self::with_config(NormalizerConfig::default())
    }

    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Rename, remap, then remove records missing a required field.
    pub fn normalize(&self, mut dataset: Dataset) -> Result<Normalized> {
        self.rename(&mut dataset)?;
        let remapped_cells = self.remap(&mut dataset);
        let (dataset, missing) = self.split_missing(dataset)?;

        let mut dropped = Vec::new();
        let mut quarantined = Vec::new();
        for (record, detail) in missing {
            match self.config.missing_policy {
                MissingFieldPolicy::Drop => dropped.push(DroppedRow {
                    line: record.line(),
                    reason: RejectionReason::MissingField,
                    fields: record.to_strings(),
                    detail,
                }),
                MissingFieldPolicy::Quarantine => quarantined.push(QuarantineRecord::new(
                    record,
                    RejectionReason::MissingField,
                    STAGE,
                    detail,
                )),
            }
        }

        debug!(
            kept = dataset.len(),
            dropped = dropped.len(),
            quarantined = quarantined.len(),
            remapped_cells,
            "schema normalized"
        );

        Ok(Normalized {
            dataset,
            dropped,
            quarantined,
            remapped_cells,
        })
    }

    /// Apply the rename mapping. Unknown source columns are ignored.
    fn rename(&self, dataset: &mut Dataset) -> Result<()> {
        for (from, to) in &self.config.renames {
            let Some(index) = dataset.column_index(from) else {
                continue;
            };
            if from == to {
                continue;
            }
            if dataset.column_index(to).is_some() {
                return Err(CleanseError::Config(format!(
                    "renaming '{}' to '{}' would duplicate an existing column",
                    from, to
                )));
            }
            dataset.columns_mut()[index] = to.clone();
        }
        Ok(())
    }

    /// Replace coded integers with labels. Returns the number of cells changed.
    fn remap(&self, dataset: &mut Dataset) -> usize {
        let codes = &self.config.categorical.codes;
        if codes.is_empty() {
            return 0;
        }

        let target = match &self.config.categorical.scope {
            RemapScope::Global => None,
            RemapScope::Column(column) => match dataset.column_index(column) {
                Some(index) => Some(index),
                None => {
                    debug!(column = %column, "categorical column not present, skipping remap");
                    return 0;
                }
            },
        };

        let mut changed = 0;
        for record in dataset.records_mut() {
            for (index, value) in record.values_mut().iter_mut().enumerate() {
                if target.is_some_and(|t| t != index) {
                    continue;
                }
                if let Some(label) = value.as_code().and_then(|code| codes.get(&code)) {
                    *value = Value::Text(label.clone());
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Separate records with a null required field from the rest.
    fn split_missing(&self, dataset: Dataset) -> Result<(Dataset, Vec<(Record, String)>)> {
        let required = self
            .config
            .required
            .iter()
            .map(|column| {
                dataset
                    .column_index(column)
                    .map(|index| (index, column.as_str()))
                    .ok_or_else(|| CleanseError::MissingColumn {
                        column: column.clone(),
                        stage: STAGE.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let (columns, records) = dataset.into_parts();
        let mut kept = Vec::with_capacity(records.len());
        let mut missing = Vec::new();

        for record in records {
            let absent = required
                .iter()
                .find(|(index, _)| record.get(*index).is_none_or(Value::is_null));
            match absent {
                Some((_, column)) => {
                    let detail = format!("{} is missing", column);
                    missing.push((record, detail));
                }
                None => kept.push(record),
            }
        }

        Ok((Dataset::from_parts(columns, kept), missing))
    }
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dataset(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
        Dataset::with_records(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.into_iter()
                .enumerate()
                .map(|(i, values)| Record::new(i + 2, values))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_renames_columns() {
        let dataset = make_dataset(
            &["id", "mail_address", "birthday_on"],
            vec![vec![Value::Integer(1), Value::from("a@b.co"), Value::from("1990-01-01")]],
        );
        let out = SchemaNormalizer::new().normalize(dataset).unwrap();
        assert_eq!(out.dataset.columns(), &["id", "email", "date_of_birth"]);
    }

    #[test]
    fn test_rename_collision_is_config_error() {
        let dataset = make_dataset(
            &["mail_address", "email", "date_of_birth"],
            vec![vec![Value::Null, Value::Null, Value::from("x")]],
        );
        let err = SchemaNormalizer::new().normalize(dataset).unwrap_err();
        assert!(matches!(err, CleanseError::Config(_)));
    }

    #[test]
    fn test_column_scoped_remap_leaves_other_columns() {
        let dataset = make_dataset(
            &["id", "gender", "date_of_birth"],
            vec![
                vec![Value::Integer(1), Value::Integer(0), Value::from("1990-01-01")],
                vec![Value::Integer(0), Value::Integer(1), Value::from("1991-01-01")],
                vec![Value::Integer(2), Value::from("0"), Value::from("1992-01-01")],
            ],
        );
        let out = SchemaNormalizer::new().normalize(dataset).unwrap();
        let records = out.dataset.records();

        assert_eq!(records[0].values()[0], Value::Integer(1));
        assert_eq!(records[0].values()[1], Value::from("F"));
        assert_eq!(records[1].values()[0], Value::Integer(0));
        assert_eq!(records[1].values()[1], Value::from("M"));
        // Text is never treated as a code.
        assert_eq!(records[2].values()[1], Value::from("0"));
        assert_eq!(out.remapped_cells, 2);
    }

    #[test]
    fn test_global_remap_touches_every_column() {
        let config = NormalizerConfig {
            categorical: CategoricalRemap {
                scope: RemapScope::Global,
                ..CategoricalRemap::default()
            },
            ..NormalizerConfig::default()
        };
        let dataset = make_dataset(
            &["id", "gender", "date_of_birth"],
            vec![vec![Value::Integer(1), Value::Integer(0), Value::Float(1.0)]],
        );
        let out = SchemaNormalizer::with_config(config)
            .normalize(dataset)
            .unwrap();

        assert_eq!(
            out.dataset.records()[0].values(),
            &[Value::from("M"), Value::from("F"), Value::from("M")]
        );
        assert_eq!(out.remapped_cells, 3);
    }

    #[test]
    fn test_missing_remap_column_is_skipped() {
        let dataset = make_dataset(
            &["id", "date_of_birth"],
            vec![vec![Value::Integer(1), Value::from("1990-01-01")]],
        );
        let out = SchemaNormalizer::new().normalize(dataset).unwrap();
        assert_eq!(out.dataset.records()[0].values()[0], Value::Integer(1));
        assert_eq!(out.remapped_cells, 0);
    }

    #[test]
    fn test_missing_birth_date_dropped_by_default() {
        let dataset = make_dataset(
            &["id", "date_of_birth"],
            vec![
                vec![Value::Integer(1), Value::from("1990-01-01")],
                vec![Value::Integer(2), Value::Null],
            ],
        );
        let out = SchemaNormalizer::new().normalize(dataset).unwrap();

        assert_eq!(out.dataset.len(), 1);
        assert!(out.quarantined.is_empty());
        assert_eq!(out.dropped.len(), 1);
        assert_eq!(out.dropped[0].line, 3);
        assert_eq!(out.dropped[0].reason, RejectionReason::MissingField);
        assert_eq!(out.dropped[0].fields, vec!["2", ""]);
    }

    #[test]
    fn test_missing_birth_date_quarantined_by_policy() {
        let config = NormalizerConfig {
            missing_policy: MissingFieldPolicy::Quarantine,
            ..NormalizerConfig::default()
        };
        let dataset = make_dataset(
            &["id", "date_of_birth"],
            vec![vec![Value::Integer(2), Value::Null]],
        );
        let out = SchemaNormalizer::with_config(config)
            .normalize(dataset)
            .unwrap();

        assert!(out.dropped.is_empty());
        assert_eq!(out.quarantined.len(), 1);
        assert_eq!(out.quarantined[0].reason, RejectionReason::MissingField);
        assert_eq!(out.quarantined[0].detail, "date_of_birth is missing");
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let dataset = make_dataset(&["id"], vec![vec![Value::Integer(1)]]);
        let err = SchemaNormalizer::new().normalize(dataset).unwrap_err();
        assert!(matches!(err, CleanseError::MissingColumn { ref column, .. } if column == "date_of_birth"));
    }

    #[test]
    fn test_config_rejects_empty_names() {
        let mut config = NormalizerConfig::default();
        config.renames.insert("x".to_string(), String::new());
        assert!(config.validate().is_err());
    }
}
