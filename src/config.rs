//! Configuration management and validation.
//!
//! Provides the settings shared by single-file and batch transcoding:
//! export layout, output naming, concurrency and progress reporting.

use crate::constants::{DEFAULT_OUTPUT_EXTENSION, DEFAULT_OUTPUT_PREFIX, PREAMBLE_LINES};
use crate::error::{Result, TranscodeError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Global configuration for COMSOL export transcoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Metadata lines skipped before the descriptor line
    pub preamble_lines: usize,

    /// Prefix prepended to the input stem to name the output file
    pub output_prefix: String,

    /// Extension of the output file
    pub output_extension: String,

    /// Number of files transcoded concurrently in a batch
    pub workers: usize,

    /// Show per-file progress bars
    pub show_progress: bool,

    /// Delete each input after its output was written successfully
    pub remove_input: bool,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            preamble_lines: PREAMBLE_LINES,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            workers: num_cpus::get().max(1),
            show_progress: true,
            remove_input: false,
        }
    }
}

impl TranscodeConfig {
    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Enable input removal after successful transcoding
    pub fn with_remove_input(mut self, remove_input: bool) -> Self {
        self.remove_input = remove_input;
        self
    }

    /// Set the output file prefix
    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Reject settings the transcoder cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(TranscodeError::configuration(
                "worker count must be at least 1",
            ));
        }
        if self.output_extension.is_empty() {
            return Err(TranscodeError::configuration(
                "output extension must not be empty",
            ));
        }
        debug!("Configuration validated: {:?}", self);
        Ok(())
    }

    /// Derive the output path of `input` inside `output_dir`.
    ///
    /// `runs/channel.txt` becomes `<output_dir>/parsed_channel.csv`.
    pub fn output_path_for(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy();
        output_dir.join(format!(
            "{}{}.{}",
            self.output_prefix, stem, self.output_extension
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranscodeConfig::default();
        assert_eq!(config.preamble_lines, 8);
        assert_eq!(config.output_prefix, "parsed_");
        assert_eq!(config.output_extension, "csv");
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = TranscodeConfig::default()
            .with_workers(3)
            .with_progress(false)
            .with_remove_input(true)
            .with_output_prefix("long_");

        assert_eq!(config.workers, 3);
        assert!(!config.show_progress);
        assert!(config.remove_input);
        assert_eq!(config.output_prefix, "long_");
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = TranscodeConfig::default().with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(TranscodeError::Configuration { .. })
        ));
    }

    #[test]
    fn test_output_path_for() {
        let config = TranscodeConfig::default();
        let path = config.output_path_for(Path::new("runs/channel.v2.txt"), Path::new("out"));
        assert_eq!(path, PathBuf::from("out/parsed_channel.v2.csv"));
    }
}
