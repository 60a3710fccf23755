//! Runs field validators in sequence over a dataset.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info_span};

use crate::dataset::{Dataset, Record};
use crate::quarantine::QuarantineRecord;

use super::validators::{BlankRecordValidator, EmailValidator, FieldValidator, PhoneValidator};
use super::verdict::{FieldError, RowError, StageFailure, Verdict};

/// Field validator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Column checked by the email validator.
    pub email_column: String,
    /// Column checked and normalized by the phone validator.
    pub phone_column: String,
    /// Evaluate rows in parallel (needs the `parallel` feature).
    pub parallel: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            email_column: "email".to_string(),
            phone_column: "phone".to_string(),
            parallel: false,
        }
    }
}

/// Result of running one validator over a dataset.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Stage name.
    pub stage: &'static str,
    /// Records that entered the stage.
    pub input: usize,
    /// Records that passed, including rewritten and errored ones.
    pub passed: usize,
    /// Rejected records as they entered the stage, original order.
    pub rejected: Vec<QuarantineRecord>,
    /// Rows whose check failed and were passed through.
    pub row_errors: Vec<RowError>,
    /// Set when the stage could not run and returned its input.
    pub failure: Option<StageFailure>,
    /// Number of records rewritten in place.
    pub rewritten: usize,
}

/// Runs validators in a fixed order, each over the survivors of the last.
pub struct ValidationEngine {
    validators: Vec<Box<dyn FieldValidator>>,
    parallel: bool,
}

impl ValidationEngine {
    /// Create the standard blank → email → phone sequence.
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            validators: vec![
                Box::new(BlankRecordValidator),
                Box::new(EmailValidator::new(config.email_column.clone())),
                Box::new(PhoneValidator::new(config.phone_column.clone())),
            ],
            parallel: config.parallel,
        }
    }

    /// Create an engine from explicit validators.
    pub fn with_validators(validators: Vec<Box<dyn FieldValidator>>) -> Self {
        Self {
            validators,
            parallel: false,
        }
    }

    /// Evaluate rows in parallel when the `parallel` feature is enabled.
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Names of the stages in run order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Whether rows are evaluated in parallel.
    pub fn is_parallel(&self) -> bool {
        cfg!(feature = "parallel") && self.parallel
    }

    /// Run every stage over the survivors of the previous one.
    ///
    /// Returns the valid dataset and one outcome per stage.
    pub fn run(&self, dataset: Dataset) -> (Dataset, Vec<StageOutcome>) {
        let mut outcomes = Vec::with_capacity(self.validators.len());
        let mut current = dataset;
        for validator in &self.validators {
            let (survivors, outcome) = self.run_stage(validator.as_ref(), current);
            current = survivors;
            outcomes.push(outcome);
        }
        (current, outcomes)
    }

    /// Run a single validator, returning the survivors and the outcome.
    pub fn run_stage(
        &self,
        validator: &dyn FieldValidator,
        dataset: Dataset,
    ) -> (Dataset, StageOutcome) {
        let stage = validator.name();
        let span = info_span!("stage", name = stage);
        let _guard = span.enter();
        let input = dataset.len();

        let field = match validator.column() {
            None => None,
            Some(column) => match dataset.column_index(column) {
                Some(index) => Some(index),
                None => {
                    let message = format!("column '{}' not found, stage skipped", column);
                    error!(stage, column, "{}", message);
                    let outcome = StageOutcome {
                        stage,
                        input,
                        passed: input,
                        rejected: Vec::new(),
                        row_errors: Vec::new(),
                        failure: Some(StageFailure {
                            stage: stage.to_string(),
                            message,
                        }),
                        rewritten: 0,
                    };
                    return (dataset, outcome);
                }
            },
        };

        let verdicts = self.evaluate(validator, dataset.records(), field);
        let (columns, records) = dataset.into_parts();

        let mut survivors = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();
        let mut row_errors = Vec::new();
        let mut rewritten = 0;

        for (mut record, verdict) in records.into_iter().zip(verdicts) {
            match verdict {
                Ok(Verdict::Pass) => survivors.push(record),
                Ok(Verdict::Rewrite { field, value }) => {
                    record.set(field, value);
                    rewritten += 1;
                    survivors.push(record);
                }
                Ok(Verdict::Reject { detail }) => {
                    rejected.push(QuarantineRecord::new(
                        record,
                        validator.reason(),
                        stage,
                        detail,
                    ));
                }
                Err(e) => {
                    error!(stage, line = record.line(), "row check failed: {}", e);
                    row_errors.push(RowError {
                        line: record.line(),
                        stage: stage.to_string(),
                        message: e.to_string(),
                    });
                    survivors.push(record);
                }
            }
        }

        debug!(
            passed = survivors.len(),
            rejected = rejected.len(),
            rewritten,
            errors = row_errors.len(),
            "stage done"
        );

        let outcome = StageOutcome {
            stage,
            input,
            passed: survivors.len(),
            rejected,
            row_errors,
            failure: None,
            rewritten,
        };
        (Dataset::from_parts(columns, survivors), outcome)
    }

    /// Compute verdicts in record order.
    #[cfg(feature = "parallel")]
    fn evaluate(
        &self,
        validator: &dyn FieldValidator,
        records: &[Record],
        field: Option<usize>,
    ) -> Vec<Result<Verdict, FieldError>> {
        use rayon::prelude::*;

        if self.parallel {
            // collect() on an indexed parallel iterator keeps input order.
            records
                .par_iter()
                .map(|record| validator.check(record, field))
                .collect()
        } else {
            records
                .iter()
                .map(|record| validator.check(record, field))
                .collect()
        }
    }

    /// Compute verdicts in record order.
    #[cfg(not(feature = "parallel"))]
    fn evaluate(
        &self,
        validator: &dyn FieldValidator,
        records: &[Record],
        field: Option<usize>,
    ) -> Vec<Result<Verdict, FieldError>> {
        records
            .iter()
            .map(|record| validator.check(record, field))
            .collect()
    }
}
