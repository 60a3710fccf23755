//! Structural row filter: drop rows whose field count differs from the header.

use std::path::Path;

use tracing::warn;

use crate::error::{CleanseError, Result};
use crate::input::read_file;
use crate::quarantine::{DroppedRow, RejectionReason};

/// A well-formed raw row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based source line where the row starts.
    pub line: usize,
    /// Fields exactly as read.
    pub fields: Vec<String>,
}

/// Output of the structural filter.
#[derive(Debug, Clone, Default)]
pub struct FilteredRows {
    /// Header fields.
    pub header: Vec<String>,
    /// Rows with exactly `header.len()` fields, in input order.
    pub rows: Vec<RawRow>,
    /// Rows excluded for a field count mismatch.
    pub dropped: Vec<DroppedRow>,
}

impl FilteredRows {
    /// Number of data rows seen, kept or dropped.
    pub fn rows_read(&self) -> usize {
        self.rows.len() + self.dropped.len()
    }
}

/// Splits delimited text and keeps only rows shaped like the header.
///
/// Runs before typing. Rows with the wrong field count are dropped with a
/// warning, never quarantined.
#[derive(Debug, Clone)]
pub struct StructuralFilter {
    delimiter: u8,
    quote: u8,
}

impl StructuralFilter {
    pub fn new(delimiter: u8, quote: u8) -> Self {
        Self { delimiter, quote }
    }

    /// Filter a file on disk.
    pub fn filter_file(&self, path: impl AsRef<Path>) -> Result<FilteredRows> {
        let contents = read_file(path.as_ref())?;
        self.filter(&contents)
    }

    /// Filter raw bytes. Fails only when the input is empty or unreadable.
    ///
    /// Empty lines between records are dropped like any other short row.
    pub fn filter(&self, bytes: &[u8]) -> Result<FilteredRows> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Err(CleanseError::EmptyData("No header row found".to_string()));
        }
        let header: Vec<String> = record.iter().map(str::to_string).collect();
        let expected = header.len();

        let mut lines = LineCounter::new(bytes);
        let mut rows = Vec::new();
        let mut dropped = Vec::new();
        let mut gap_start = reader.position().byte() as usize;

        while reader.read_record(&mut record)? {
            let start = skip_terminators(bytes, gap_start);
            for line in lines.empty_lines(gap_start, start) {
                dropped.push(drop_row(line, Vec::new(), expected));
            }
            let line = lines.line_at(start);
            let fields: Vec<String> = record.iter().map(str::to_string).collect();

            if fields.len() == expected {
                rows.push(RawRow { line, fields });
            } else {
                dropped.push(drop_row(line, fields, expected));
            }
            gap_start = reader.position().byte() as usize;
        }

        for line in lines.empty_lines(gap_start, bytes.len()) {
            dropped.push(drop_row(line, Vec::new(), expected));
        }

        Ok(FilteredRows {
            header,
            rows,
            dropped,
        })
    }
}

fn drop_row(line: usize, fields: Vec<String>, expected: usize) -> DroppedRow {
    warn!(
        line,
        expected,
        found = fields.len(),
        "Skipping row with invalid number of columns"
    );
    DroppedRow {
        line,
        reason: RejectionReason::Structural,
        detail: format!("{} fields, expected {}", fields.len(), expected),
        fields,
    }
}

/// Offset of the first byte at or after `from` that is not a line terminator.
/// The csv reader skips these bytes silently before a record.
fn skip_terminators(bytes: &[u8], from: usize) -> usize {
    from + bytes[from.min(bytes.len())..]
        .iter()
        .take_while(|&&b| b == b'\r' || b == b'\n')
        .count()
}

/// Physical line numbers by byte offset. Offsets must be queried in order.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            line: 1,
        }
    }

    /// 1-based line containing `offset`.
    fn line_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.bytes.len());
        if offset > self.offset {
            self.line += self.bytes[self.offset..offset]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.offset = offset;
        }
        self.line
    }

    /// Lines lying entirely inside the terminator run `[from, to)`.
    ///
    /// The run may begin with the `\n` of the previous record's `\r\n`,
    /// in which case its first line belongs to that record.
    fn empty_lines(&mut self, from: usize, to: usize) -> std::ops::Range<usize> {
        let mid_line = from > 0 && from <= self.bytes.len() && self.bytes[from - 1] != b'\n';
        let first = self.line_at(from) + usize::from(mid_line);
        let last = self.line_at(to);
        first..last.max(first)
    }
}
