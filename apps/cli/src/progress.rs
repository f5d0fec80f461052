//! Progress bar rendering for CLI downloads

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use modelfetch_core::{format_bytes, format_duration, ProgressSink, SinkFactory};
use modelfetch_types::{DownloadRequest, TransferProgress};
use std::sync::Arc;
use std::time::Duration;

/// Owns the shared terminal area; hands out one sink per download.
pub struct ConsoleProgress {
    multi: MultiProgress,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }

    pub fn sink_factory(&self) -> SinkFactory {
        let multi = self.multi.clone();
        Arc::new(move |request| Box::new(ConsoleSink::new(&multi, request)) as Box<dyn ProgressSink>)
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Interactive sink: one updating line per transfer with percentage,
/// transferred/total, speed, and ETA. When the total size is unknown it
/// falls back to a plain byte counter.
pub struct ConsoleSink {
    bar: ProgressBar,
    sized: bool,
}

impl ConsoleSink {
    pub fn new(multi: &MultiProgress, request: &DownloadRequest) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        bar.set_message(label_for(&request.url));
        Self { bar, sized: false }
    }
}

fn label_for(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
        .unwrap()
        .progress_chars("█▓▒░  ")
}

impl ProgressSink for ConsoleSink {
    fn update(&mut self, progress: &TransferProgress) {
        match progress.total {
            Some(total) => {
                if !self.sized {
                    self.bar.set_style(bar_style());
                    self.bar.set_length(total);
                    self.sized = true;
                }
                self.bar.set_position(progress.downloaded);
            }
            None => {
                self.bar
                    .set_message(format!("{} downloaded", format_bytes(progress.downloaded)));
            }
        }
    }

    fn complete(&mut self, filename: &str, elapsed: Duration) {
        self.bar.finish_with_message(format!(
            "{} {} ({})",
            style("✓").green().bold(),
            style(filename).cyan(),
            format_duration(elapsed)
        ));
    }

    fn fail(&mut self, reason: &str) {
        self.bar.abandon_with_message(format!(
            "{} Failed: {}",
            style("✗").red().bold(),
            reason
        ));
    }
}
