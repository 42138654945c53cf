//! Concurrent transcoding of several exports.
//!
//! Files are independent: each one runs the single-file transcoder on a
//! blocking worker, at most `workers` at a time. A failing file is recorded in
//! the report and never stops the others. Outcomes keep the input order.

use crate::config::TranscodeConfig;
use crate::error::{Result, TranscodeError};
use crate::models::{BatchReport, FileOutcome};
use crate::transcoder::{BarProgress, NoProgress, ProgressSink, StreamingTranscoder};

use futures::stream::{self, StreamExt};
use indicatif::MultiProgress;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::{fs, task};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reject inputs that would be written to the same output file
pub fn check_output_conflicts(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &TranscodeConfig,
) -> Result<()> {
    let mut by_output: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
    let mut order = Vec::new();

    for input in inputs {
        let output = config.output_path_for(input, output_dir);
        let claimants = by_output.entry(output.clone()).or_default();
        if claimants.is_empty() {
            order.push(output);
        }
        claimants.push(input.clone());
    }

    for output in order {
        if let Some(claimants) = by_output.remove(&output) {
            if claimants.len() > 1 {
                return Err(TranscodeError::OutputConflict {
                    path: output,
                    inputs: claimants,
                });
            }
        }
    }

    Ok(())
}

/// Transcode every input into `output_dir`, bounded by `config.workers`
pub async fn transcode_batch(
    inputs: &[PathBuf],
    output_dir: &Path,
    config: &TranscodeConfig,
    cancel: CancellationToken,
) -> Result<BatchReport> {
    let start_time = Instant::now();
    config.validate()?;

    if inputs.is_empty() {
        return Err(TranscodeError::NoInputs);
    }
    check_output_conflicts(inputs, output_dir, config)?;

    let workers = config.workers.min(inputs.len());
    info!(
        "Transcoding {} files into {} with {} workers",
        inputs.len(),
        output_dir.display(),
        workers
    );

    let transcoder = Arc::new(StreamingTranscoder::new(config.clone()));
    let progress_group = config.show_progress.then(MultiProgress::new);

    let outcomes = stream::iter(inputs.iter().cloned())
        .map(|input| {
            let transcoder = transcoder.clone();
            let output_dir = output_dir.to_path_buf();
            let cancel = cancel.clone();
            let progress: Box<dyn ProgressSink> = match &progress_group {
                Some(group) => Box::new(BarProgress::in_group(group, &display_name(&input))),
                None => Box::new(NoProgress),
            };

            async move {
                let task_input = input.clone();
                let result = task::spawn_blocking(move || {
                    transcoder.transcode_file(
                        &task_input,
                        &output_dir,
                        progress.as_ref(),
                        Some(&cancel),
                    )
                })
                .await
                .unwrap_or_else(|e| {
                    Err(TranscodeError::Interrupted {
                        reason: format!("worker task failed: {}", e),
                    })
                });

                match &result {
                    Ok(summary) => debug!(
                        "Finished {}: {} rows ({:.0} rows/s)",
                        input.display(),
                        summary.rows_written,
                        summary.rows_per_second()
                    ),
                    Err(e) => error!("Failed to transcode {}: {:#}", input.display(), e),
                }

                FileOutcome {
                    input_path: input,
                    result,
                }
            }
        })
        .buffered(workers)
        .collect::<Vec<_>>()
        .await;

    let mut report = BatchReport {
        outcomes,
        ..Default::default()
    };

    if config.remove_input {
        report.inputs_removed = remove_transcoded_inputs(&report.outcomes).await;
    }

    report.elapsed = start_time.elapsed();
    info!(
        "Batch finished: {} succeeded, {} failed, {} rows in {:?}",
        report.files_succeeded(),
        report.files_failed(),
        report.total_rows(),
        report.elapsed
    );

    Ok(report)
}

async fn remove_transcoded_inputs(outcomes: &[FileOutcome]) -> usize {
    let mut removed = 0;
    for outcome in outcomes.iter().filter(|o| o.result.is_ok()) {
        match fs::remove_file(&outcome.input_path).await {
            Ok(()) => {
                info!("{} was removed", outcome.input_path.display());
                removed += 1;
            }
            Err(e) => warn!(
                "Could not remove {}: {}",
                outcome.input_path.display(),
                e
            ),
        }
    }
    removed
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
