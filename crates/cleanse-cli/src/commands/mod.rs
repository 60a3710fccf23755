//! CLI command implementations.

pub mod check;
pub mod filter;
pub mod run;

use colored::Colorize;
use cleanse::config::parse_delimiter;
use cleanse::{MissingFieldPolicy, PipelineConfig, PipelineReport, RemapScope};

use crate::cli::PipelineArgs;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config file, if any, and apply flag overrides.
pub fn build_config(args: &PipelineArgs) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(d) = &args.delimiter {
        config.parser.delimiter = parse_delimiter(d)?;
    }
    if let Some(d) = &args.output_delimiter {
        config.output.delimiter = Some(parse_delimiter(d)?);
    }
    if let Some(column) = &args.email_column {
        config.validation.email_column = column.clone();
    }
    if let Some(column) = &args.phone_column {
        config.validation.phone_column = column.clone();
    }
    if let Some(column) = &args.gender_column {
        config.normalizer.categorical.scope = RemapScope::Column(column.clone());
    }
    if args.global_remap {
        config.normalizer.categorical.scope = RemapScope::Global;
    }
    if args.quarantine_missing {
        config.normalizer.missing_policy = MissingFieldPolicy::Quarantine;
    }
    if args.parallel {
        config.validation.parallel = true;
    }

    config.validate()?;
    Ok(config)
}

/// Print the human-readable run summary.
pub fn print_summary(report: &PipelineReport) {
    println!(
        "Read {} rows: {} clean, {} quarantined, {} dropped",
        report.rows_read.to_string().white().bold(),
        report.clean_rows.to_string().green(),
        report.quarantined_rows.to_string().yellow(),
        report.dropped.len().to_string().red()
    );
    println!();

    println!("{}", "Stages:".yellow().bold());
    for stage in &report.stages {
        let status = if stage.failed {
            "skipped".red().to_string()
        } else {
            "ok".green().to_string()
        };
        println!(
            "  {:24} {:>7} in {:>7} out {:>7} rejected {:>7} dropped  {}",
            stage.name, stage.input, stage.passed, stage.rejected, stage.dropped, status
        );
    }

    if !report.quarantined_by_reason.is_empty() {
        println!();
        println!("{}", "Quarantined by reason:".yellow().bold());
        for (reason, count) in &report.quarantined_by_reason {
            println!("  {:24} {}", reason.label(), count);
        }
    }

    if !report.dropped.is_empty() {
        println!();
        println!("{}", "Dropped rows:".yellow().bold());
        for row in report.dropped.iter().take(10) {
            println!("  line {:>6}  {}  {}", row.line, row.reason.label(), row.detail.dimmed());
        }
        if report.dropped.len() > 10 {
            println!("  ... and {} more", report.dropped.len() - 10);
        }
    }

    for failure in &report.stage_failures {
        println!(
            "{} {}: {}",
            "Stage failed".red().bold(),
            failure.stage,
            failure.message
        );
    }
    if !report.row_errors.is_empty() {
        println!(
            "{} {} rows could not be checked",
            "Warning:".yellow().bold(),
            report.row_errors.len()
        );
    }
}
