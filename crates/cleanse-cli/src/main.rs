//! Cleanse CLI - record validation and quarantine for delimited files.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};
use logging::{LogConfig, init_logging};

fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_flags(cli.verbose, cli.quiet));

    let result = match cli.command {
        Commands::Run {
            file,
            clean_dir,
            garbage_dir,
            clean_output,
            garbage_output,
            report,
            options,
        } => commands::run::run(
            commands::run::RunPaths {
                file,
                clean_dir,
                garbage_dir,
                clean_output,
                garbage_output,
                report,
            },
            &options,
        ),

        Commands::Filter {
            file,
            output,
            delimiter,
            config,
        } => commands::filter::run(file, output, delimiter, config),

        Commands::Check {
            file,
            json,
            options,
        } => commands::check::run(file, json, &options),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
