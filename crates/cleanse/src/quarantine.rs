//! Quarantine accumulation for rejected records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::Record;

/// Why a row left the clean set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Every field is null.
    Blank,
    /// Email does not match the address pattern.
    BadEmail,
    /// Phone has characters other than digits and separators.
    BadPhone,
    /// A required field is null.
    MissingField,
    /// Field count differs from the header.
    Structural,
}

impl RejectionReason {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            RejectionReason::Blank => "Blank record",
            RejectionReason::BadEmail => "Invalid email",
            RejectionReason::BadPhone => "Invalid phone",
            RejectionReason::MissingField => "Missing required field",
            RejectionReason::Structural => "Wrong field count",
        }
    }

    /// Tag written to the quarantine file.
    pub fn tag(&self) -> &'static str {
        match self {
            RejectionReason::Blank => "blank",
            RejectionReason::BadEmail => "bad_email",
            RejectionReason::BadPhone => "bad_phone",
            RejectionReason::MissingField => "missing_field",
            RejectionReason::Structural => "structural",
        }
    }
}

/// A rejected record in its original form.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarantineRecord {
    /// The record as it entered the rejecting stage.
    pub record: Record,
    /// Rejection reason.
    pub reason: RejectionReason,
    /// Name of the stage that rejected it.
    pub stage: String,
    /// Short explanation, e.g. the offending value.
    pub detail: String,
}

impl QuarantineRecord {
    pub fn new(
        record: Record,
        reason: RejectionReason,
        stage: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            record,
            reason,
            stage: stage.into(),
            detail: detail.into(),
        }
    }
}

/// A row removed without being quarantined.
///
/// Rows with the wrong field count cannot be expressed in the canonical
/// schema, and rows missing a required field are dropped under the default
/// policy. Both are listed in the run report instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRow {
    /// 1-based source line.
    pub line: usize,
    /// Why the row was dropped.
    pub reason: RejectionReason,
    /// Raw fields as read.
    pub fields: Vec<String>,
    /// Short explanation.
    pub detail: String,
}

/// All records rejected during one pipeline run, in stage order.
#[derive(Debug, Clone, Default)]
pub struct Quarantine {
    columns: Vec<String>,
    entries: Vec<QuarantineRecord>,
}

impl Quarantine {
    /// Create an empty quarantine for the given canonical columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            entries: Vec::new(),
        }
    }

    /// Canonical columns of the quarantined records.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append one rejected record.
    pub fn push(&mut self, entry: QuarantineRecord) {
        debug_assert_eq!(entry.record.len(), self.columns.len());
        self.entries.push(entry);
    }

    /// Append a stage's rejects, keeping their order.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = QuarantineRecord>) {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Entries in the order they were rejected.
    pub fn entries(&self) -> &[QuarantineRecord] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuarantineRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with a given reason.
    pub fn with_reason(&self, reason: RejectionReason) -> impl Iterator<Item = &QuarantineRecord> {
        self.entries.iter().filter(move |e| e.reason == reason)
    }

    /// Number of entries per reason, ordered by first appearance.
    pub fn counts_by_reason(&self) -> IndexMap<RejectionReason, usize> {
        let mut counts = IndexMap::new();
        for entry in &self.entries {
            *counts.entry(entry.reason).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn entry(line: usize, reason: RejectionReason) -> QuarantineRecord {
        QuarantineRecord::new(
            Record::new(line, vec![Value::Integer(line as i64)]),
            reason,
            "test",
            "",
        )
    }

    #[test]
    fn test_extend_preserves_order() {
        let mut quarantine = Quarantine::new(vec!["id".into()]);
        quarantine.extend(vec![entry(4, RejectionReason::Blank), entry(2, RejectionReason::Blank)]);
        quarantine.extend(vec![entry(3, RejectionReason::BadEmail)]);

        let lines: Vec<_> = quarantine.iter().map(|e| e.record.line()).collect();
        assert_eq!(lines, vec![4, 2, 3]);
    }

    #[test]
    fn test_counts_by_reason() {
        let mut quarantine = Quarantine::new(vec!["id".into()]);
        quarantine.push(entry(2, RejectionReason::BadEmail));
        quarantine.push(entry(3, RejectionReason::BadPhone));
        quarantine.push(entry(4, RejectionReason::BadEmail));

        let counts = quarantine.counts_by_reason();
        assert_eq!(counts.get(&RejectionReason::BadEmail), Some(&2));
        assert_eq!(counts.get(&RejectionReason::BadPhone), Some(&1));
        assert_eq!(counts.keys().next(), Some(&RejectionReason::BadEmail));
        assert_eq!(quarantine.with_reason(RejectionReason::BadPhone).count(), 1);
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        let json = serde_json::to_string(&RejectionReason::MissingField).unwrap();
        assert_eq!(json, "\"missing_field\"");
        assert_eq!(RejectionReason::MissingField.tag(), "missing_field");
    }
}
