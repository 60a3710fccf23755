//! The cleansing pipeline.
//!
//! Stages run in a fixed order, each over the survivors of the previous one:
//!
//! 1. structural filter (wrong field count → dropped with a warning)
//! 2. typed parsing
//! 3. schema normalization (renames, categorical codes, required fields)
//! 4. blank record validator
//! 5. email validator
//! 6. phone validator (also strips separators from valid numbers)
//!
//! Every input row ends up in exactly one place: the clean set, the
//! quarantine, or the report's list of dropped rows.

mod report;

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, info_span};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::input::{ParsedInput, Parser};
use crate::normalize::SchemaNormalizer;
use crate::output::{check_audit_columns, write_dataset, write_quarantine};
use crate::quarantine::Quarantine;
use crate::validation::ValidationEngine;

pub use report::{OutputPaths, PipelineReport, StageSummary};

/// Input and output files of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    /// Raw delimited input.
    pub input: PathBuf,
    /// Clean output file.
    pub clean: PathBuf,
    /// Quarantine output file.
    pub quarantine: PathBuf,
    /// Optional JSON report file.
    pub report: Option<PathBuf>,
}

impl Locations {
    pub fn new(
        input: impl Into<PathBuf>,
        clean: impl Into<PathBuf>,
        quarantine: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            clean: clean.into(),
            quarantine: quarantine.into(),
            report: None,
        }
    }

    /// Derive output names from the input file name:
    /// `<clean_dir>/cleaned_<stem>.csv` and `<garbage_dir>/garbage_<stem>.csv`.
    pub fn from_dirs(
        input: impl Into<PathBuf>,
        clean_dir: impl AsRef<Path>,
        garbage_dir: impl AsRef<Path>,
    ) -> Self {
        let input = input.into();
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        let clean = clean_dir.as_ref().join(format!("cleaned_{}.csv", stem));
        let quarantine = garbage_dir.as_ref().join(format!("garbage_{}.csv", stem));
        Self::new(input, clean, quarantine)
    }

    /// Also write a JSON report.
    pub fn with_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report = Some(path.into());
        self
    }
}

/// Result of processing a dataset in memory.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Records that passed every stage.
    pub clean: Dataset,
    /// Records rejected by any stage, in stage order.
    pub quarantine: Quarantine,
    /// Counts and dropped rows.
    pub report: PipelineReport,
}

/// The cleansing pipeline. Holds configuration only; each call owns its data.
pub struct Pipeline {
    config: PipelineConfig,
    parser: Parser,
    normalizer: SchemaNormalizer,
    engine: ValidationEngine,
}

impl Pipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration.
    pub fn with_config(config: PipelineConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let normalizer = SchemaNormalizer::with_config(config.normalizer.clone());
        let engine = ValidationEngine::new(&config.validation);

        Self {
            config,
            parser,
            normalizer,
            engine,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Delimiter used for written files.
    pub fn output_delimiter(&self) -> u8 {
        self.config
            .output
            .delimiter
            .unwrap_or(self.config.parser.delimiter)
    }

    /// Read the input file, process it and write both outputs.
    pub fn run(&self, locations: &Locations) -> Result<PipelineReport> {
        self.config.validate()?;
        let span = info_span!("run", input = %locations.input.display());
        let _guard = span.enter();
        info!("cleansing started");

        let (parsed, source) = self.parser.parse_file(&locations.input)?;
        let mut output = self.process_parsed(parsed)?;

        check_audit_columns(output.quarantine.columns(), &self.config.output)?;
        let delimiter = self.output_delimiter();
        write_dataset(&locations.clean, &output.clean, delimiter)?;
        write_quarantine(
            &locations.quarantine,
            &output.quarantine,
            &self.config.output,
            delimiter,
        )?;

        output.report.source = Some(source);
        output.report.outputs = Some(OutputPaths {
            clean: locations.clean.clone(),
            quarantine: locations.quarantine.clone(),
        });
        if let Some(path) = &locations.report {
            output.report.save(path)?;
        }

        info!(
            clean = output.report.clean_rows,
            quarantined = output.report.quarantined_rows,
            dropped = output.report.dropped.len(),
            "cleansing finished"
        );
        Ok(output.report)
    }

    /// Process delimited text in memory.
    pub fn process(&self, text: &str) -> Result<PipelineOutput> {
        self.process_bytes(text.as_bytes())
    }

    /// Process delimited bytes in memory.
    pub fn process_bytes(&self, bytes: &[u8]) -> Result<PipelineOutput> {
        self.config.validate()?;
        let parsed = self.parser.parse_bytes(bytes)?;
        self.process_parsed(parsed)
    }

    fn process_parsed(&self, parsed: ParsedInput) -> Result<PipelineOutput> {
        let rows_read = parsed.rows_read();
        let ParsedInput {
            dataset,
            dropped: structural,
        } = parsed;

        let mut stages = vec![StageSummary {
            name: "structural_filter".to_string(),
            input: rows_read,
            passed: dataset.len(),
            rejected: 0,
            dropped: structural.len(),
            rewritten: 0,
            failed: false,
        }];

        let normalizer_input = dataset.len();
        let normalized = self.normalizer.normalize(dataset)?;
        stages.push(StageSummary {
            name: "schema_normalizer".to_string(),
            input: normalizer_input,
            passed: normalized.dataset.len(),
            rejected: normalized.quarantined.len(),
            dropped: normalized.dropped.len(),
            rewritten: normalized.remapped_cells,
            failed: false,
        });

        let mut quarantine = Quarantine::new(normalized.dataset.columns().to_vec());
        quarantine.extend(normalized.quarantined);

        let mut dropped = structural;
        dropped.extend(normalized.dropped);

        if self.engine.is_parallel() {
            info!("evaluating validator rows in parallel");
        }
        let (clean, outcomes) = self.engine.run(normalized.dataset);

        let mut stage_failures = Vec::new();
        let mut row_errors = Vec::new();
        for outcome in outcomes {
            stages.push(StageSummary {
                name: outcome.stage.to_string(),
                input: outcome.input,
                passed: outcome.passed,
                rejected: outcome.rejected.len(),
                dropped: 0,
                rewritten: outcome.rewritten,
                failed: outcome.failure.is_some(),
            });
            quarantine.extend(outcome.rejected);
            stage_failures.extend(outcome.failure);
            row_errors.extend(outcome.row_errors);
        }

        let report = PipelineReport {
            source: None,
            outputs: None,
            generated_at: Utc::now(),
            columns: clean.columns().to_vec(),
            rows_read,
            clean_rows: clean.len(),
            quarantined_rows: quarantine.len(),
            stages,
            quarantined_by_reason: quarantine.counts_by_reason(),
            dropped,
            stage_failures,
            row_errors,
        };
        debug_assert!(report.is_balanced());

        Ok(PipelineOutput {
            clean,
            quarantine,
            report,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;
    use crate::normalize::MissingFieldPolicy;
    use crate::quarantine::RejectionReason;

    const SCENARIO: &str = "id;email;phone;date_of_birth\n\
                            1;a@b.com;555-1234;1990-01-01\n\
                            2;bad;555-1234;1990-01-01\n\
                            3;;;;\n\
                            4;a@b.com;phone;\n";

    #[test]
    fn test_scenario_default_policy() {
        let output = Pipeline::new().process(SCENARIO).unwrap();

        assert_eq!(output.clean.len(), 1);
        let clean = &output.clean.records()[0];
        assert_eq!(clean.values()[0], Value::Integer(1));
        assert_eq!(clean.values()[2], Value::from("5551234"));

        assert_eq!(output.quarantine.len(), 1);
        let rejected = &output.quarantine.entries()[0];
        assert_eq!(rejected.reason, RejectionReason::BadEmail);
        assert_eq!(rejected.record.values()[1], Value::from("bad"));

        let report = &output.report;
        assert_eq!(report.rows_read, 4);
        assert_eq!(report.dropped_count(RejectionReason::Structural), 1);
        assert_eq!(report.dropped_count(RejectionReason::MissingField), 1);
        assert!(report.is_balanced());
    }

    #[test]
    fn test_scenario_quarantine_policy() {
        let mut config = PipelineConfig::default();
        config.normalizer.missing_policy = MissingFieldPolicy::Quarantine;
        let output = Pipeline::with_config(config).process(SCENARIO).unwrap();

        let reasons: Vec<_> = output.quarantine.iter().map(|e| e.reason).collect();
        // Normalizer rejects come before validator rejects.
        assert_eq!(
            reasons,
            vec![RejectionReason::MissingField, RejectionReason::BadEmail]
        );
        assert_eq!(output.quarantine.entries()[0].record.line(), 5);
        assert!(output.report.is_balanced());
    }

    #[test]
    fn test_stage_summaries() {
        let output = Pipeline::new().process(SCENARIO).unwrap();
        let names: Vec<_> = output.report.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "structural_filter",
                "schema_normalizer",
                "blank_record_validator",
                "email_validator",
                "phone_validator"
            ]
        );
        let phone = &output.report.stages[4];
        assert_eq!((phone.input, phone.passed, phone.rewritten), (1, 1, 1));
    }

    #[test]
    fn test_missing_phone_column_degrades_locally() {
        let text = "id;email;date_of_birth\n1;a@b.com;1990-01-01\n2;x;1990-01-01\n";
        let output = Pipeline::new().process(text).unwrap();

        assert_eq!(output.clean.len(), 1);
        assert_eq!(output.quarantine.len(), 1);
        assert_eq!(output.report.stage_failures.len(), 1);
        assert_eq!(output.report.stage_failures[0].stage, "phone_validator");
        assert!(output.report.stages[4].failed);
        assert!(output.report.has_errors());
    }

    #[test]
    fn test_locations_from_dirs() {
        let locations = Locations::from_dirs("/data/lifebear.csv", "/out/clean", "/out/garbage")
            .with_report("/out/report.json");
        assert_eq!(locations.clean, PathBuf::from("/out/clean/cleaned_lifebear.csv"));
        assert_eq!(
            locations.quarantine,
            PathBuf::from("/out/garbage/garbage_lifebear.csv")
        );
        assert_eq!(locations.report, Some(PathBuf::from("/out/report.json")));
    }
}
