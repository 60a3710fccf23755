//! Filter command - structural filter only.

use std::path::{Path, PathBuf};

use colored::Colorize;
use cleanse::PipelineConfig;
use cleanse::config::parse_delimiter;
use cleanse::input::StructuralFilter;
use cleanse::output::write_rows;

use super::CommandResult;

/// Default output: `<stem>_valid_rows.csv` next to the input.
fn default_output(file: &Path) -> PathBuf {
    let stem = file.file_stem().unwrap_or_default().to_string_lossy();
    file.with_file_name(format!("{}_valid_rows.csv", stem))
}

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    delimiter: Option<String>,
    config: Option<PathBuf>,
) -> CommandResult {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let config = match config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let delimiter = match delimiter {
        Some(d) => parse_delimiter(&d)?,
        None => config.parser.delimiter,
    };

    let filtered = StructuralFilter::new(delimiter, config.parser.quote).filter_file(&file)?;
    let output = output.unwrap_or_else(|| default_output(&file));
    write_rows(&output, &filtered.header, &filtered.rows, delimiter)?;

    println!(
        "Kept {} of {} rows ({} dropped)",
        filtered.rows.len().to_string().green().bold(),
        filtered.rows_read(),
        filtered.dropped.len().to_string().red()
    );
    for row in &filtered.dropped {
        println!("  line {:>6}  {}", row.line, row.detail.dimmed());
    }
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output.display().to_string().white()
    );

    Ok(())
}
