//! Streaming transcoder for COMSOL text exports.
//!
//! Drives the header pipeline once per file and streams every data line
//! through the [`RowExpander`], writing CSV rows as they are produced. Memory
//! use is bounded by the longest line; the file is never materialized.
//!
//! Output is staged in a temporary file inside the output directory and only
//! moved to its final name once every row has been written, so a failed
//! transcode leaves no output behind.

pub mod progress;

#[cfg(test)]
mod tests;

pub use progress::{BarProgress, NoProgress, ProgressSink};

use crate::config::TranscodeConfig;
use crate::constants::{LINE_COUNT_BLOCK_SIZE, OUTPUT_BUFFER_SIZE, PROGRESS_UPDATE_INTERVAL};
use crate::error::{Result, TranscodeError};
use crate::expander::RowExpander;
use crate::header::{HeaderTable, check_declared_counts, parse_preamble};
use crate::models::TranscodeSummary;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Count newline-terminated lines without decoding the file
pub fn count_lines(path: &Path) -> Result<u64> {
    let mut file = File::open(path)?;
    let mut block = vec![0u8; LINE_COUNT_BLOCK_SIZE];
    let mut total = 0u64;

    loop {
        let read = match file.read(&mut block) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        total += block[..read].iter().filter(|&&byte| byte == b'\n').count() as u64;
    }

    Ok(total)
}

/// Converts COMSOL exports into long-format CSV files
#[derive(Debug, Clone, Default)]
pub struct StreamingTranscoder {
    config: TranscodeConfig,
}

impl StreamingTranscoder {
    pub fn new(config: TranscodeConfig) -> Self {
        Self { config }
    }

    /// Transcode `input` into `output_dir`, returning the written CSV path
    pub fn transcode(&self, input: &Path, output_dir: &Path) -> Result<PathBuf> {
        self.transcode_file(input, output_dir, &NoProgress, None)
            .map(|summary| summary.output_path)
    }

    /// Transcode one file with progress reporting and optional cancellation
    pub fn transcode_file(
        &self,
        input: &Path,
        output_dir: &Path,
        progress: &dyn ProgressSink,
        cancel: Option<&CancellationToken>,
    ) -> Result<TranscodeSummary> {
        let start_time = Instant::now();

        if !input.exists() {
            return Err(TranscodeError::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        if !output_dir.is_dir() {
            return Err(TranscodeError::OutputDirNotFound {
                path: output_dir.to_path_buf(),
            });
        }

        let total_lines = count_lines(input)?;
        let expected_data_lines = total_lines.saturating_sub(self.config.preamble_lines as u64 + 1);
        progress.start(expected_data_lines);
        debug!(
            "{}: {} lines, {} expected data lines",
            input.display(),
            total_lines,
            expected_data_lines
        );

        let reader = BufReader::new(File::open(input)?);
        let output_path = self.config.output_path_for(input, output_dir);

        let mut staged = NamedTempFile::new_in(output_dir)?;
        let streamed = {
            let mut writer = BufWriter::with_capacity(OUTPUT_BUFFER_SIZE, staged.as_file_mut());
            let streamed = self.transcode_stream(reader, &mut writer, progress, cancel);
            streamed.and_then(|summary| {
                writer.flush()?;
                Ok(summary)
            })
        };

        let mut summary = match streamed {
            Ok(summary) => summary,
            Err(e) => {
                progress.finish("failed");
                // Dropping the staged file removes it
                return Err(e.with_path(input));
            }
        };

        staged.as_file().sync_all()?;
        staged
            .persist(&output_path)
            .map_err(|e| TranscodeError::Io(e.error))?;

        check_declared_counts(
            input,
            &summary.metadata,
            summary.variable_count,
            summary.data_lines,
        );

        summary.input_path = input.to_path_buf();
        summary.output_path = output_path;
        summary.elapsed = start_time.elapsed();
        progress.finish("done");

        info!(
            "Transcoded {} -> {} ({} data lines, {} rows, {} combinations) in {:?}",
            input.display(),
            summary.output_path.display(),
            summary.data_lines,
            summary.rows_written,
            summary.combination_count,
            summary.elapsed
        );

        Ok(summary)
    }

    /// Transcode an export read from `reader` into `writer`.
    ///
    /// The returned summary has empty paths and zero elapsed time; callers
    /// working with files fill those in.
    pub fn transcode_stream<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        writer: &mut W,
        progress: &dyn ProgressSink,
        cancel: Option<&CancellationToken>,
    ) -> Result<TranscodeSummary> {
        let mut buffer = Vec::new();

        let mut preamble = Vec::with_capacity(self.config.preamble_lines);
        for _ in 0..self.config.preamble_lines {
            if !read_line(&mut reader, &mut buffer)? {
                return Err(TranscodeError::MissingDescriptor {
                    path: PathBuf::new(),
                    lines_read: preamble.len(),
                });
            }
            preamble.push(String::from_utf8_lossy(&buffer).trim_end().to_string());
        }
        let metadata = parse_preamble(&preamble);
        debug!("Export metadata: {:?}", metadata);

        if !read_line(&mut reader, &mut buffer)? {
            return Err(TranscodeError::MissingDescriptor {
                path: PathBuf::new(),
                lines_read: self.config.preamble_lines,
            });
        }
        let header = HeaderTable::parse(&String::from_utf8_lossy(&buffer))?;
        writeln!(writer, "{}", header.column_header())?;

        let expander = RowExpander::new(&header);
        let mut line_number = self.config.preamble_lines + 1;
        let mut data_lines = 0usize;
        let mut rows_written = 0usize;
        let mut dropped_tokens = 0usize;
        let mut pending_progress = 0u64;

        while read_line(&mut reader, &mut buffer)? {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(io::Error::new(ErrorKind::Interrupted, "transcode cancelled").into());
            }
            line_number += 1;

            let line = String::from_utf8_lossy(&buffer);
            let tokens: Vec<&str> = line.split_whitespace().collect();
            for row in expander.expand(line_number, &tokens) {
                row?.write_csv(writer)?;
                rows_written += 1;
            }
            dropped_tokens += expander.dropped_tokens(tokens.len());
            data_lines += 1;

            pending_progress += 1;
            if pending_progress == PROGRESS_UPDATE_INTERVAL {
                progress.advance(pending_progress);
                pending_progress = 0;
            }
        }
        progress.advance(pending_progress);

        if dropped_tokens > 0 {
            debug!("Dropped {} tokens from partial blocks", dropped_tokens);
        }

        Ok(TranscodeSummary {
            data_lines,
            rows_written,
            dropped_tokens,
            combination_count: header.combination_count(),
            variable_count: header.variables().len(),
            metadata,
            ..Default::default()
        })
    }
}

/// Read one raw line into `buffer`; false at end of input
fn read_line<R: BufRead>(reader: &mut R, buffer: &mut Vec<u8>) -> io::Result<bool> {
    buffer.clear();
    Ok(reader.read_until(b'\n', buffer)? > 0)
}
