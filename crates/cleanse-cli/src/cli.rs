//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cleanse: record validation and quarantine for delimited files
#[derive(Parser)]
#[command(name = "cleanse")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write clean and quarantine files
    Run {
        /// Path to the raw data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory for the clean file (named cleaned_<stem>.csv)
        #[arg(long, default_value = "clean")]
        clean_dir: PathBuf,

        /// Directory for the quarantine file (named garbage_<stem>.csv)
        #[arg(long, default_value = "garbage")]
        garbage_dir: PathBuf,

        /// Explicit clean output path (overrides --clean-dir)
        #[arg(long)]
        clean_output: Option<PathBuf>,

        /// Explicit quarantine output path (overrides --garbage-dir)
        #[arg(long)]
        garbage_output: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long, value_name = "JSON")]
        report: Option<PathBuf>,

        #[command(flatten)]
        options: PipelineArgs,
    },

    /// Drop rows with the wrong number of fields and write the rest
    Filter {
        /// Path to the raw data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (default: <stem>_valid_rows.csv next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Field delimiter (single character, or \t)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Load settings from a JSON config file
        #[arg(long, value_name = "JSON")]
        config: Option<PathBuf>,
    },

    /// Process a file in memory and print a summary without writing
    Check {
        /// Path to the raw data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        options: PipelineArgs,
    },
}

/// Pipeline settings shared by `run` and `check`. Flags override the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Load settings from a JSON config file
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Input field delimiter (single character, or \t)
    #[arg(short, long)]
    pub delimiter: Option<String>,

    /// Output field delimiter (default: same as input)
    #[arg(long)]
    pub output_delimiter: Option<String>,

    /// Column checked by the email validator
    #[arg(long)]
    pub email_column: Option<String>,

    /// Column checked and normalized by the phone validator
    #[arg(long)]
    pub phone_column: Option<String>,

    /// Column whose numeric codes are mapped to labels
    #[arg(long, conflicts_with = "global_remap")]
    pub gender_column: Option<String>,

    /// Apply the categorical code map to every column
    #[arg(long)]
    pub global_remap: bool,

    /// Quarantine rows missing a required field instead of dropping them
    #[arg(long)]
    pub quarantine_missing: bool,

    /// Validate rows in parallel (needs the `parallel` feature)
    #[arg(long)]
    pub parallel: bool,
}
