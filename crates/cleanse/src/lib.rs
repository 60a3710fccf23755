//! Cleanse: record validation and quarantine for delimited tabular files.
//!
//! A raw file goes through a fixed sequence of stages. Rows with the wrong
//! number of fields are dropped, column names and categorical codes are
//! normalized, and each record is checked for blankness, a valid email and a
//! valid phone number. Records that fail a check are never discarded: they
//! are routed to a quarantine set tagged with the reason and stage.
//!
//! # Core Principles
//!
//! - **Total accounting**: every input row is clean, quarantined or reported as dropped
//! - **Stage isolation**: a stage that cannot run passes its input through and is reported
//! - **Auditable output**: quarantined rows carry their rejection reason
//!
//! # Example
//!
//! ```no_run
//! use cleanse::{Locations, Pipeline};
//!
//! let pipeline = Pipeline::new();
//! let locations = Locations::from_dirs("raw/lifebear.csv", "clean", "garbage");
//! let report = pipeline.run(&locations).unwrap();
//!
//! println!("Clean rows: {}", report.clean_rows);
//! println!("Quarantined: {}", report.quarantined_rows);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod input;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod quarantine;
pub mod validation;

pub use config::PipelineConfig;
pub use dataset::{Dataset, Record, Value};
pub use error::{CleanseError, Result};
pub use input::{ParsedInput, Parser, ParserConfig, SourceMetadata, StructuralFilter};
pub use normalize::{CategoricalRemap, MissingFieldPolicy, NormalizerConfig, RemapScope, SchemaNormalizer};
pub use pipeline::{Locations, Pipeline, PipelineOutput, PipelineReport, StageSummary};
pub use quarantine::{DroppedRow, Quarantine, QuarantineRecord, RejectionReason};
pub use validation::{FieldValidator, ValidationConfig, ValidationEngine, Verdict};
