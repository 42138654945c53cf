//! COMSOL Transcoder Library
//!
//! Converts COMSOL Multiphysics text exports (spreadsheet format, one node per
//! line with every variable and parameter combination side by side) into
//! long-format CSV files with one row per node and parameter combination.
//!
//! This library provides tools for:
//! - Parsing the descriptor line into coordinates, variables and parameters
//! - Expanding each data line into one output row per parameter combination
//! - Streaming large exports with bounded memory and atomic output
//! - Transcoding batches of exports concurrently with progress reporting

pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod expander;
pub mod header;
pub mod models;
pub mod run_log;
pub mod transcoder;

pub use batch::{check_output_conflicts, transcode_batch};
pub use config::TranscodeConfig;
pub use error::{Result, TranscodeError};
pub use expander::{OutputRow, RowExpander};
pub use header::{HeaderTable, ParameterTable, normalize_descriptor};
pub use models::{BatchReport, ExportMetadata, FileOutcome, TranscodeSummary};
pub use transcoder::{BarProgress, NoProgress, ProgressSink, StreamingTranscoder, count_lines};
