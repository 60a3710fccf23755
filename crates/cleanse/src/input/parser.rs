//! Delimited file reader producing typed datasets.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dataset::{Dataset, Record, Value};
use crate::error::{CleanseError, Result};
use crate::quarantine::DroppedRow;

use super::source::SourceMetadata;
use super::structural::{FilteredRows, StructuralFilter};

/// Tokens read as null when no configuration overrides them.
const DEFAULT_NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "NULL", "None", "nil"];

/// Parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Field delimiter.
    #[serde(with = "crate::config::delimiter")]
    pub delimiter: u8,
    /// Quote character.
    #[serde(with = "crate::config::delimiter")]
    pub quote: u8,
    /// Cell contents read as null (trimmed, case-insensitive).
    pub null_tokens: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b';',
            quote: b'"',
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ParserConfig {
    /// Check if a raw cell represents a missing value.
    ///
    /// Whitespace-only cells are always null.
    pub fn is_null(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty()
            || self
                .null_tokens
                .iter()
                .any(|token| token.trim().eq_ignore_ascii_case(trimmed))
    }

    /// Type a raw cell.
    pub fn classify(&self, raw: &str) -> Value {
        if self.is_null(raw) {
            Value::Null
        } else {
            Value::from_text(raw)
        }
    }
}

/// Parsed input: the typed dataset and the rows the structural filter dropped.
#[derive(Debug, Clone)]
pub struct ParsedInput {
    pub dataset: Dataset,
    pub dropped: Vec<DroppedRow>,
}

impl ParsedInput {
    /// Data rows read, kept or dropped.
    pub fn rows_read(&self) -> usize {
        self.dataset.len() + self.dropped.len()
    }
}

/// Reads delimited data files.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The structural filter this parser applies first.
    pub fn structural_filter(&self) -> StructuralFilter {
        StructuralFilter::new(self.config.delimiter, self.config.quote)
    }

    /// Read a file and return the parsed input and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(ParsedInput, SourceMetadata)> {
        let path = path.as_ref();
        let contents = read_file(path)?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let parsed = self.parse_bytes(&contents)?;

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            contents.len() as u64,
            self.config.delimiter,
            parsed.rows_read(),
            parsed.dataset.columns().len(),
        );

        Ok((parsed, metadata))
    }

    /// Parse bytes directly.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedInput> {
        let filtered = self.structural_filter().filter(bytes)?;
        debug!(
            kept = filtered.rows.len(),
            dropped = filtered.dropped.len(),
            "structural filter done"
        );
        self.type_rows(filtered)
    }

    /// Turn well-formed raw rows into typed records.
    pub fn type_rows(&self, filtered: FilteredRows) -> Result<ParsedInput> {
        let FilteredRows {
            header,
            rows,
            dropped,
        } = filtered;

        let records = rows
            .into_iter()
            .map(|row| {
                let values = row.fields.iter().map(|f| self.config.classify(f)).collect();
                Record::new(row.line, values)
            })
            .collect();

        Ok(ParsedInput {
            dataset: Dataset::with_records(header, records)?,
            dropped,
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a whole file, mapping failures to the path.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| CleanseError::io(path, e))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| CleanseError::io(path, e))?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_null_value() {
        let config = ParserConfig::default();
        assert!(config.is_null(""));
        assert!(config.is_null("   "));
        assert!(config.is_null("NA"));
        assert!(config.is_null("na"));
        assert!(config.is_null("N/A"));
        assert!(config.is_null("nan"));
        assert!(config.is_null("NULL"));
        assert!(config.is_null(" None "));
        assert!(!config.is_null("value"));
        assert!(!config.is_null("0"));
    }

    #[test]
    fn test_custom_null_tokens() {
        let config = ParserConfig {
            null_tokens: vec!["missing".to_string()],
            ..ParserConfig::default()
        };
        assert!(config.is_null("MISSING"));
        assert!(config.is_null(""));
        assert!(!config.is_null("NA"));
    }

    #[test]
    fn test_parse_bytes_types_cells() {
        let parser = Parser::new();
        let parsed = parser
            .parse_bytes(b"id;email;gender\n1;a@b.co;0\n2;;NA\n")
            .unwrap();

        let dataset = &parsed.dataset;
        assert_eq!(dataset.columns(), &["id", "email", "gender"]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.records()[0].values(),
            &[Value::Integer(1), Value::from("a@b.co"), Value::Integer(0)]
        );
        assert_eq!(
            dataset.records()[1].values(),
            &[Value::Integer(2), Value::Null, Value::Null]
        );
    }

    #[test]
    fn test_parse_bytes_reports_dropped() {
        let parser = Parser::new();
        let parsed = parser.parse_bytes(b"a;b\n1;2\n1;2;3\n").unwrap();
        assert_eq!(parsed.dataset.len(), 1);
        assert_eq!(parsed.dropped.len(), 1);
        assert_eq!(parsed.rows_read(), 2);
    }

    #[test]
    fn test_parse_file_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a;b\n1;2\n3;4\n").unwrap();

        let (parsed, metadata) = Parser::new().parse_file(file.path()).unwrap();
        assert_eq!(parsed.dataset.len(), 2);
        assert_eq!(metadata.row_count, 2);
        assert_eq!(metadata.column_count, 2);
        assert_eq!(metadata.format, "csv-semicolon");
        assert_eq!(metadata.size_bytes, 12);
        assert!(metadata.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Parser::new()
            .parse_file("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, CleanseError::Io { .. }));
    }
}
