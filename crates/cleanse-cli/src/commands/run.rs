//! Run command - full pipeline with clean and quarantine output files.

use std::path::PathBuf;

use colored::Colorize;
use cleanse::{Locations, Pipeline};

use super::{CommandResult, build_config, print_summary};
use crate::cli::PipelineArgs;

/// Input and output paths given on the command line.
pub struct RunPaths {
    pub file: PathBuf,
    pub clean_dir: PathBuf,
    pub garbage_dir: PathBuf,
    pub clean_output: Option<PathBuf>,
    pub garbage_output: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl RunPaths {
    fn locations(self) -> Locations {
        let mut locations = Locations::from_dirs(self.file, &self.clean_dir, &self.garbage_dir);
        if let Some(path) = self.clean_output {
            locations.clean = path;
        }
        if let Some(path) = self.garbage_output {
            locations.quarantine = path;
        }
        if let Some(path) = self.report {
            locations = locations.with_report(path);
        }
        locations
    }
}

pub fn run(paths: RunPaths, options: &PipelineArgs) -> CommandResult {
    if !paths.file.exists() {
        return Err(format!("File not found: {}", paths.file.display()).into());
    }

    let config = build_config(options)?;
    let locations = paths.locations();

    println!(
        "{} {}",
        "Cleansing".cyan().bold(),
        locations.input.display().to_string().white()
    );

    let report = Pipeline::with_config(config).run(&locations)?;

    print_summary(&report);
    println!();
    println!(
        "{} {}",
        "Clean data".green().bold(),
        locations.clean.display().to_string().white()
    );
    println!(
        "{} {}",
        "Quarantine".yellow().bold(),
        locations.quarantine.display().to_string().white()
    );
    if let Some(path) = &locations.report {
        println!(
            "{} {}",
            "Report".blue().bold(),
            path.display().to_string().white()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_outputs_override_dirs() {
        let paths = RunPaths {
            file: PathBuf::from("raw/users.csv"),
            clean_dir: PathBuf::from("clean"),
            garbage_dir: PathBuf::from("garbage"),
            clean_output: None,
            garbage_output: Some(PathBuf::from("rejects.csv")),
            report: None,
        };
        let locations = paths.locations();
        assert_eq!(locations.clean, PathBuf::from("clean/cleaned_users.csv"));
        assert_eq!(locations.quarantine, PathBuf::from("rejects.csv"));
        assert!(locations.report.is_none());
    }

    #[test]
    fn test_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("users.csv");
        std::fs::write(
            &input,
            "id;email;phone;date_of_birth\n1;a@b.com;555-1234;1990-01-01\n2;bad;1;1990-01-01\n",
        )
        .unwrap();

        let paths = RunPaths {
            file: input,
            clean_dir: dir.path().join("clean"),
            garbage_dir: dir.path().join("garbage"),
            clean_output: None,
            garbage_output: None,
            report: Some(dir.path().join("report.json")),
        };
        run(paths, &PipelineArgs::default()).unwrap();

        let clean = std::fs::read_to_string(dir.path().join("clean/cleaned_users.csv")).unwrap();
        assert_eq!(clean, "id;email;phone;date_of_birth\n1;a@b.com;5551234;1990-01-01\n");
        assert!(dir.path().join("garbage/garbage_users.csv").exists());
        assert!(dir.path().join("report.json").exists());
    }
}
