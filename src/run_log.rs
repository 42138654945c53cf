//! Append-only run log.
//!
//! Each CLI run appends timestamped `timestamp | kind | message` lines to a
//! plain text file and closes with a separator line, so consecutive runs stay
//! readable in one file. The log is opened by the command runner and passed
//! around explicitly; nothing here is global.

use crate::constants::RUN_LOG_SEPARATOR;
use crate::error::Result;
use chrono::Local;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Kind of a run log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLogEvent {
    Args,
    Done,
    Error,
}

impl RunLogEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunLogEvent::Args => "args",
            RunLogEvent::Done => "done",
            RunLogEvent::Error => "error",
        }
    }
}

/// Open run log file
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RunLog {
    /// Open `path` for appending, creating missing parent directories
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Run log opened: {}", path.display());

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Append one timestamped entry
    pub fn record(&mut self, event: RunLogEvent, message: impl fmt::Display) -> Result<()> {
        writeln!(
            self.writer,
            "{} | {} | {}",
            Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
            event.as_str(),
            message
        )?;
        Ok(())
    }

    /// Write the closing separator and flush
    pub fn close(mut self) -> Result<()> {
        writeln!(self.writer, "{}", RUN_LOG_SEPARATOR)?;
        self.writer.flush()?;
        debug!("Run log closed: {}", self.path.display());
        Ok(())
    }
}
