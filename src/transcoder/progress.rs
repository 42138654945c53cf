//! Progress reporting for line-by-line transcoding
//!
//! The transcoder only emits a total and per-line advances; how they are
//! shown is up to the sink. Progress never affects the output.

use crate::constants::{PROGRESS_CHARS, PROGRESS_TEMPLATE};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Receiver of progress signals from a transcode
pub trait ProgressSink: Send + Sync {
    /// Announce the expected number of data lines
    fn start(&self, total: u64);

    /// Record that `lines` more data lines were processed
    fn advance(&self, lines: u64);

    /// Finish with a short status message
    fn finish(&self, message: &str);
}

/// Sink that discards every signal
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: u64) {}
    fn advance(&self, _lines: u64) {}
    fn finish(&self, _message: &str) {}
}

/// Terminal progress bar sink
#[derive(Clone)]
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    /// Create a standalone bar labelled with `label`
    pub fn new(label: &str) -> Self {
        Self::with_bar(ProgressBar::new(0), label)
    }

    /// Create a bar attached to a batch display
    pub fn in_group(group: &MultiProgress, label: &str) -> Self {
        Self::with_bar(group.add(ProgressBar::new(0)), label)
    }

    fn with_bar(bar: ProgressBar, label: &str) -> Self {
        let style = ProgressStyle::default_bar()
            .template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars(PROGRESS_CHARS);
        bar.set_style(style);
        bar.set_message(label.to_string());
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
    }

    fn advance(&self, lines: u64) {
        self.bar.inc(lines);
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
