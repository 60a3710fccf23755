//! Pipeline configuration and persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CleanseError, Result};
use crate::input::ParserConfig;
use crate::normalize::NormalizerConfig;
use crate::output::{OutputConfig, ensure_parent};
use crate::validation::ValidationConfig;

/// Configuration for a pipeline run.
///
/// Every section has defaults matching the legacy user export, so a
/// JSON file only needs the keys it wants to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input parsing.
    pub parser: ParserConfig,
    /// Renames, categorical codes, required fields.
    pub normalizer: NormalizerConfig,
    /// Field validator columns and execution.
    pub validation: ValidationConfig,
    /// Output files.
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CleanseError::io(path, e))?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let file = File::create(path).map_err(|e| CleanseError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(|e| CleanseError::io(path, e))
    }

    /// Check settings that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        let parser = &self.parser;
        if parser.delimiter == parser.quote {
            return Err(CleanseError::InvalidDelimiter(format!(
                "delimiter and quote are both '{}'",
                display(parser.delimiter)
            )));
        }
        if self.output.delimiter.unwrap_or(parser.delimiter) == parser.quote {
            return Err(CleanseError::InvalidDelimiter(format!(
                "output delimiter collides with quote '{}'",
                display(parser.quote)
            )));
        }
        if self.validation.email_column.is_empty() || self.validation.phone_column.is_empty() {
            return Err(CleanseError::Config(
                "validator column names must not be empty".to_string(),
            ));
        }
        if self.output.reason_column.is_empty() || self.output.stage_column.is_empty() {
            return Err(CleanseError::Config(
                "quarantine audit column names must not be empty".to_string(),
            ));
        }
        if self.output.reason_column == self.output.stage_column {
            return Err(CleanseError::Config(format!(
                "reason and stage columns are both '{}'",
                self.output.reason_column
            )));
        }
        self.normalizer.validate()
    }
}

/// Parse a delimiter given as a single character, `\t` or `tab`.
pub fn parse_delimiter(text: &str) -> Result<u8> {
    match text {
        "\\t" | "tab" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(CleanseError::InvalidDelimiter(format!(
            "'{}' is not a single ASCII character",
            text
        ))),
    }
}

/// Render a delimiter the way [`parse_delimiter`] reads it.
pub fn display(byte: u8) -> String {
    match byte {
        b'\t' => "\\t".to_string(),
        b => (b as char).to_string(),
    }
}

/// Serde adapter storing a delimiter byte as a one-character string.
pub(crate) mod delimiter {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(byte: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::display(*byte))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_delimiter(&text).map_err(D::Error::custom)
    }
}

/// Same as [`delimiter`] for optional settings.
pub(crate) mod optional_delimiter {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(byte: &Option<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        match byte {
            Some(b) => serializer.serialize_some(&super::display(*b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| super::parse_delimiter(&text).map_err(D::Error::custom))
            .transpose()
    }
}
