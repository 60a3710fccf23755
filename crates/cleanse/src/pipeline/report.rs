//! Run report: what happened to every input row.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CleanseError, Result};
use crate::input::SourceMetadata;
use crate::output::ensure_parent;
use crate::quarantine::{DroppedRow, RejectionReason};
use crate::validation::{RowError, StageFailure};

/// Counts for one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    /// Stage name.
    pub name: String,
    /// Rows entering the stage.
    pub input: usize,
    /// Rows handed to the next stage.
    pub passed: usize,
    /// Rows sent to quarantine.
    pub rejected: usize,
    /// Rows removed without quarantine.
    pub dropped: usize,
    /// Rows whose values were rewritten.
    pub rewritten: usize,
    /// True if the stage could not run and passed its input through.
    pub failed: bool,
}

/// Where a run wrote its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub clean: PathBuf,
    pub quarantine: PathBuf,
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Input file metadata, when the run read a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,
    /// Files written, when the run wrote any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<OutputPaths>,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Canonical columns after normalization.
    pub columns: Vec<String>,
    /// Data rows in the input (header excluded).
    pub rows_read: usize,
    /// Rows in the clean output.
    pub clean_rows: usize,
    /// Rows in the quarantine output.
    pub quarantined_rows: usize,
    /// Per-stage counts in run order.
    pub stages: Vec<StageSummary>,
    /// Quarantine counts by reason, in order of first rejection.
    pub quarantined_by_reason: IndexMap<RejectionReason, usize>,
    /// Rows removed without quarantine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedRow>,
    /// Validator stages that could not run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stage_failures: Vec<StageFailure>,
    /// Rows a validator could not check.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub row_errors: Vec<RowError>,
}

impl PipelineReport {
    /// Number of dropped rows with a given reason.
    pub fn dropped_count(&self, reason: RejectionReason) -> usize {
        self.dropped.iter().filter(|d| d.reason == reason).count()
    }

    /// Rows that ended up somewhere: clean, quarantined or dropped.
    pub fn accounted_rows(&self) -> usize {
        self.clean_rows + self.quarantined_rows + self.dropped.len()
    }

    /// True when every input row is accounted for exactly once.
    pub fn is_balanced(&self) -> bool {
        self.accounted_rows() == self.rows_read
    }

    /// True when any stage failed or any row could not be checked.
    pub fn has_errors(&self) -> bool {
        !self.stage_failures.is_empty() || !self.row_errors.is_empty()
    }

    /// Save the report as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = File::create(path).map_err(|e| CleanseError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| CleanseError::io(path, e))
    }

    /// Load a report saved with [`PipelineReport::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CleanseError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PipelineReport {
        let mut by_reason = IndexMap::new();
        by_reason.insert(RejectionReason::BadEmail, 1);
        PipelineReport {
            source: None,
            outputs: None,
            generated_at: Utc::now(),
            columns: vec!["id".into()],
            rows_read: 4,
            clean_rows: 2,
            quarantined_rows: 1,
            stages: Vec::new(),
            quarantined_by_reason: by_reason,
            dropped: vec![DroppedRow {
                line: 4,
                reason: RejectionReason::Structural,
                fields: vec!["3".into(), "".into()],
                detail: "2 fields, expected 1".into(),
            }],
            stage_failures: Vec::new(),
            row_errors: Vec::new(),
        }
    }

    #[test]
    fn test_balance() {
        let report = sample();
        assert_eq!(report.accounted_rows(), 4);
        assert!(report.is_balanced());
        assert_eq!(report.dropped_count(RejectionReason::Structural), 1);
        assert_eq!(report.dropped_count(RejectionReason::MissingField), 0);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_json_uses_reason_tags() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["quarantined_by_reason"]["bad_email"], 1);
        assert_eq!(json["dropped"][0]["reason"], "structural");
        assert!(json.get("stage_failures").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.json");
        sample().save(&path).unwrap();

        let loaded = PipelineReport::load(&path).unwrap();
        assert_eq!(loaded.rows_read, 4);
        assert_eq!(loaded.quarantined_by_reason.get(&RejectionReason::BadEmail), Some(&1));
        assert_eq!(loaded.dropped.len(), 1);
    }

    #[test]
    fn test_saved_file_is_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let report = sample();
        report.save(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, serde_json::to_string_pretty(&report).unwrap());
    }
}
