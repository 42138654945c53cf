//! Error handling for COMSOL export transcoding.
//!
//! Every failure is fatal for the file it occurs in. Batch runs record the
//! error against that file and carry on with the rest.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Output directory not found: {path}")]
    OutputDirNotFound { path: PathBuf },

    #[error("Descriptor line missing in file: {path} (only {lines_read} lines present)")]
    MissingDescriptor { path: PathBuf, lines_read: usize },

    #[error("Malformed parameter token '{token}': expected name=value pairs")]
    MalformedParameter { token: String },

    #[error("Malformed header in file: {path} - {reason}")]
    MalformedHeader { path: PathBuf, reason: String },

    #[error(
        "Data line {line} expands to combination {index}, but the header only declares {available}"
    )]
    CombinationOutOfRange {
        line: usize,
        index: usize,
        available: usize,
    },

    #[error("Output path {path} would be written by several inputs: {inputs:?}")]
    OutputConflict { path: PathBuf, inputs: Vec<PathBuf> },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("No input files to transcode")]
    NoInputs,

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl TranscodeError {
    /// Attach the input file to a header classification failure
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            TranscodeError::MalformedParameter { token } => TranscodeError::MalformedHeader {
                path: path.into(),
                reason: format!("parameter token '{}' has no name=value separator", token),
            },
            TranscodeError::MalformedHeader {
                path: existing,
                reason,
            } if existing.as_os_str().is_empty() => TranscodeError::MalformedHeader {
                path: path.into(),
                reason,
            },
            TranscodeError::MissingDescriptor {
                path: existing,
                lines_read,
            } if existing.as_os_str().is_empty() => TranscodeError::MissingDescriptor {
                path: path.into(),
                lines_read,
            },
            other => other,
        }
    }

    pub fn is_io(&self) -> bool {
        matches!(
            self,
            TranscodeError::Io(_)
                | TranscodeError::InputNotFound { .. }
                | TranscodeError::OutputDirNotFound { .. }
        )
    }

    pub fn is_malformed_header(&self) -> bool {
        matches!(
            self,
            TranscodeError::MalformedParameter { .. }
                | TranscodeError::MalformedHeader { .. }
                | TranscodeError::MissingDescriptor { .. }
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        TranscodeError::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
