//! Command implementation for the COMSOL transcoder CLI
//!
//! Sets up logging and the run log, resolves paths, runs the batch and
//! reports the outcome.

use crate::batch::transcode_batch;
use crate::cli::args::Args;
use crate::cli::input::{prepare_output_dir, resolve_inputs};
use crate::error::{Result, TranscodeError};
use crate::models::BatchReport;
use crate::run_log::{RunLog, RunLogEvent};

use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Main command runner
pub async fn run(args: Args, cancel: CancellationToken) -> Result<BatchReport> {
    setup_logging(&args)?;
    args.validate()?;

    let mut run_log = args.run_log.as_deref().map(RunLog::open).transpose()?;
    if let Some(log) = run_log.as_mut() {
        log.record(RunLogEvent::Args, format!("{:?}", args))?;
    }

    let outcome = execute(&args, cancel).await;

    if let Some(mut log) = run_log {
        match &outcome {
            Ok(report) => {
                for failed in report.outcomes.iter().filter(|o| o.result.is_err()) {
                    if let Err(e) = &failed.result {
                        log.record(
                            RunLogEvent::Error,
                            format!("{}: {}", failed.input_path.display(), e),
                        )?;
                    }
                }
                log.record(
                    RunLogEvent::Done,
                    format!(
                        "{} succeeded, {} failed, {} rows",
                        report.files_succeeded(),
                        report.files_failed(),
                        report.total_rows()
                    ),
                )?;
            }
            Err(e) => log.record(RunLogEvent::Error, e)?,
        }
        log.close()?;
    }

    outcome
}

async fn execute(args: &Args, cancel: CancellationToken) -> Result<BatchReport> {
    let inputs = resolve_inputs(&args.inputs)
        .map_err(|e| TranscodeError::configuration(format!("{:#}", e)))?;
    if inputs.is_empty() {
        return Err(TranscodeError::NoInputs);
    }

    let output_dir = prepare_output_dir(&args.output)
        .map_err(|e| TranscodeError::configuration(format!("{:#}", e)))?;

    if !args.quiet {
        println!("{}", "Starting COMSOL export transcoding".bright_green().bold());
        println!("  {} {}", "Inputs:".bright_cyan(), inputs.len());
        println!("  {} {}", "Output:".bright_cyan(), output_dir.display());
    }

    let report = transcode_batch(&inputs, &output_dir, &args.to_config(), cancel).await?;

    if !args.quiet {
        print_summary(&report);
    }

    Ok(report)
}

/// Set up structured logging
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("comsol_transcoder={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| {
            TranscodeError::configuration(format!("Failed to initialize logging: {}", e))
        })?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!("\n{}", "Transcoding Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        report.elapsed.as_millis().to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files transcoded:".bright_cyan(),
        report.files_succeeded().to_string().bright_white()
    );
    if report.files_failed() > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            report.files_failed().to_string().bright_red().bold()
        );
        for outcome in &report.outcomes {
            if let Err(e) = &outcome.result {
                println!(
                    "    {} {}",
                    outcome.input_path.display().to_string().bright_red(),
                    e
                );
            }
        }
    }
    if report.inputs_removed > 0 {
        println!(
            "  {} {}",
            "Inputs removed:".bright_cyan(),
            report.inputs_removed.to_string().bright_white()
        );
    }
    println!(
        "  {} {}",
        "Total rows:".bright_cyan(),
        report.total_rows().to_string().bright_white().bold()
    );
}
