//! Check command - dry run that prints a summary and writes nothing.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;
use cleanse::Pipeline;

use super::{CommandResult, build_config, print_summary};
use crate::cli::PipelineArgs;

pub fn run(file: PathBuf, json_output: bool, options: &PipelineArgs) -> CommandResult {
    let bytes = fs::read(&file).map_err(|e| format!("Cannot read {}: {}", file.display(), e))?;
    let config = build_config(options)?;
    let output = Pipeline::with_config(config).process_bytes(&bytes)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Checked".cyan().bold(),
        file.display().to_string().white()
    );
    print_summary(&output.report);

    if output.quarantine.is_empty() && output.report.dropped.is_empty() {
        println!();
        println!("{}", "No issues found - data looks clean!".green());
    }
    Ok(())
}
