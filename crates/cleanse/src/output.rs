//! Delimited writers for the clean and quarantine sets.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::{CleanseError, Result};
use crate::input::RawRow;
use crate::quarantine::Quarantine;

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Delimiter for written files (None = same as input).
    #[serde(with = "crate::config::optional_delimiter")]
    pub delimiter: Option<u8>,
    /// Quarantine column holding the rejection reason tag.
    pub reason_column: String,
    /// Quarantine column holding the rejecting stage.
    pub stage_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            reason_column: "rejection_reason".to_string(),
            stage_column: "rejected_by".to_string(),
        }
    }
}

/// Create the parent directory of a path if needed.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| CleanseError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Fail if a data column has the name of a quarantine audit column.
pub fn check_audit_columns(columns: &[String], config: &OutputConfig) -> Result<()> {
    for audit in [&config.reason_column, &config.stage_column] {
        if columns.contains(audit) {
            return Err(CleanseError::Config(format!(
                "quarantine column '{}' clashes with a data column",
                audit
            )));
        }
    }
    Ok(())
}

fn create_writer(path: &Path, delimiter: u8) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent(path)?;
    let file = File::create(path).map_err(|e| CleanseError::io(path, e))?;
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file)))
}

fn finish<W: Write>(mut writer: csv::Writer<W>, path: &Path) -> Result<()> {
    writer.flush().map_err(|e| CleanseError::io(path, e))
}

/// Write a dataset with its header. Nulls become empty cells.
pub fn write_dataset(path: impl AsRef<Path>, dataset: &Dataset, delimiter: u8) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create_writer(path, delimiter)?;
    writer.write_record(dataset.columns())?;
    for record in dataset.records() {
        writer.write_record(record.to_strings())?;
    }
    finish(writer, path)
}

/// Write quarantined records with trailing reason and stage columns.
pub fn write_quarantine(
    path: impl AsRef<Path>,
    quarantine: &Quarantine,
    config: &OutputConfig,
    delimiter: u8,
) -> Result<()> {
    let path = path.as_ref();
    check_audit_columns(quarantine.columns(), config)?;

    let mut writer = create_writer(path, delimiter)?;
    let mut header = quarantine.columns().to_vec();
    header.push(config.reason_column.clone());
    header.push(config.stage_column.clone());
    writer.write_record(&header)?;

    for entry in quarantine.iter() {
        let mut row = entry.record.to_strings();
        row.push(entry.reason.tag().to_string());
        row.push(entry.stage.clone());
        writer.write_record(&row)?;
    }
    finish(writer, path)
}

/// Write raw rows verbatim under a header.
pub fn write_rows(
    path: impl AsRef<Path>,
    header: &[String],
    rows: &[RawRow],
    delimiter: u8,
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = create_writer(path, delimiter)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row.fields)?;
    }
    finish(writer, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Record, Value};
    use crate::quarantine::{QuarantineRecord, RejectionReason};

    #[test]
    fn test_write_dataset_renders_nulls_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("clean.csv");
        let dataset = Dataset::with_records(
            vec!["id".into(), "phone".into()],
            vec![Record::new(2, vec![Value::Integer(1), Value::Null])],
        )
        .unwrap();

        write_dataset(&path, &dataset, b';').unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id;phone\n1;\n");
    }

    #[test]
    fn test_write_quarantine_appends_audit_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.csv");
        let mut quarantine = Quarantine::new(vec!["id".into(), "email".into()]);
        quarantine.push(QuarantineRecord::new(
            Record::new(3, vec![Value::Integer(2), Value::from("bad")]),
            RejectionReason::BadEmail,
            "email_validator",
            "'bad' is not a valid email",
        ));

        write_quarantine(&path, &quarantine, &OutputConfig::default(), b',').unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "id,email,rejection_reason,rejected_by\n2,bad,bad_email,email_validator\n"
        );
    }

    #[test]
    fn test_audit_column_clash() {
        let dir = tempfile::tempdir().unwrap();
        let quarantine = Quarantine::new(vec!["rejected_by".into()]);
        let err = write_quarantine(
            dir.path().join("g.csv"),
            &quarantine,
            &OutputConfig::default(),
            b',',
        )
        .unwrap_err();
        assert!(matches!(err, CleanseError::Config(_)));
    }

    #[test]
    fn test_write_rows_quotes_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let rows = vec![RawRow {
            line: 2,
            fields: vec!["x;y".into(), "z".into()],
        }];
        write_rows(&path, &["a".to_string(), "b".to_string()], &rows, b';').unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a;b\n\"x;y\";z\n");
    }
}
