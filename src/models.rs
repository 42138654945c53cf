//! Core data structures shared across the transcoder.
//!
//! Preamble metadata, per-file summaries and batch reports.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Metadata declared in the 8-line preamble of a COMSOL export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub model: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub dimension: Option<usize>,
    pub nodes: Option<usize>,
    pub expressions: Option<usize>,
    pub description: Option<String>,
    pub length_unit: Option<String>,
}

/// Result of transcoding a single export file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscodeSummary {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Lines read after the descriptor line
    pub data_lines: usize,
    /// CSV rows written, excluding the column header
    pub rows_written: usize,
    /// Tokens discarded as trailing partial blocks
    pub dropped_tokens: usize,
    pub combination_count: usize,
    /// Distinct variable headings in the descriptor line
    pub variable_count: usize,
    pub metadata: ExportMetadata,
    pub elapsed: Duration,
}

impl TranscodeSummary {
    /// Output rows per elapsed second
    pub fn rows_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.rows_written as f64 / secs
        }
    }
}

/// Outcome of one file within a batch
#[derive(Debug)]
pub struct FileOutcome {
    pub input_path: PathBuf,
    pub result: crate::Result<TranscodeSummary>,
}

/// Aggregated batch statistics
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    pub inputs_removed: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn files_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn files_failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn total_rows(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|summary| summary.rows_written)
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.files_failed() == 0
    }
}
