//! Command-line argument definitions for the COMSOL transcoder
//!
//! This module defines the CLI interface using the clap derive API.

use crate::config::TranscodeConfig;
use crate::constants::DEFAULT_OUTPUT_DIR;
use crate::error::{Result, TranscodeError};
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the COMSOL export transcoder
///
/// Converts COMSOL Multiphysics text exports (one line per mesh point, every
/// parameter combination side by side) into long-format CSV tables with one
/// row per point and parameter combination.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "comsol-transcoder",
    version,
    about = "Convert COMSOL text exports into long-format CSV tables",
    long_about = "Streams COMSOL Multiphysics text exports and rewrites them as long-format \
                  CSV: one row per mesh point and parameter combination, with parameter, \
                  coordinate and variable columns. Each input produces \
                  <output>/parsed_<name>.csv."
)]
pub struct Args {
    /// Input exports: files, directories (scanned for *.txt) or glob patterns
    #[arg(
        short = 'i',
        long = "input",
        value_name = "PATH",
        num_args = 1..,
        required = true
    )]
    pub inputs: Vec<String>,

    /// Output directory for generated CSV files (created if missing)
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Number of files transcoded concurrently (defaults to the CPU count)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Delete each input once its CSV has been written
    #[arg(long = "remove-input")]
    pub remove_input: bool,

    /// Append a record of this run to the given log file
    #[arg(long = "run-log", value_name = "FILE")]
    pub run_log: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(TranscodeError::configuration(
                "--workers must be at least 1",
            ));
        }

        if self.output.exists() && !self.output.is_dir() {
            return Err(TranscodeError::configuration(format!(
                "Output path is not a directory: {}",
                self.output.display()
            )));
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress bars
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }

    /// Build the transcoder configuration from the arguments
    pub fn to_config(&self) -> TranscodeConfig {
        let config = TranscodeConfig::default()
            .with_progress(self.show_progress())
            .with_remove_input(self.remove_input);
        match self.workers {
            Some(workers) => config.with_workers(workers),
            None => config,
        }
    }
}
