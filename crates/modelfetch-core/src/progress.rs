//! Progress reporting surface
//!
//! A [`ProgressSink`] consumes byte-count updates from a single transfer and
//! renders them however it likes. The sink is chosen once per transfer at
//! launch time and is never re-evaluated inside the chunk loop.

use modelfetch_types::TransferProgress;
use std::time::Duration;
use tracing::{error, info};

/// Consumer of progress events for one transfer. Events arrive from the
/// task that owns the download; no call returns a value back into the
/// transfer logic.
pub trait ProgressSink: Send {
    /// Called after every chunk is written to disk.
    fn update(&mut self, progress: &TransferProgress);

    /// Called exactly once when the transfer finishes successfully.
    fn complete(&mut self, filename: &str, elapsed: Duration);

    /// Called exactly once when the transfer fails, instead of `complete`.
    fn fail(&mut self, reason: &str);
}

/// Sink for non-interactive environments: no intermediate rendering, only
/// the terminal event is logged.
#[derive(Debug, Default)]
pub struct HeadlessSink;

impl ProgressSink for HeadlessSink {
    fn update(&mut self, _progress: &TransferProgress) {}

    fn complete(&mut self, filename: &str, elapsed: Duration) {
        info!("Downloaded {} in {}", filename, format_duration(elapsed));
    }

    fn fail(&mut self, reason: &str) {
        error!("Download failed: {}", reason);
    }
}

const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Format a byte count with two decimals and the largest fitting unit.
pub fn format_bytes(size: u64) -> String {
    let mut size = size as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, UNITS[unit])
}

/// Format an elapsed duration as `1h 2m 5s`, omitting leading zero parts.
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_formatting() {
        assert_eq!(format_bytes(0), "0.00 Bytes");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1_073_741_824), "1.00 GB");
    }

    #[test]
    fn bytes_formatting_caps_at_terabytes() {
        assert_eq!(format_bytes(1024u64.pow(4)), "1.00 TB");
        assert_eq!(format_bytes(1024u64.pow(5)), "1024.00 TB");
    }

    #[test]
    fn duration_formatting_drops_leading_zero_parts() {
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn duration_formatting_keeps_inner_zeroes() {
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h 0m 0s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_secs(0)), "0s");
    }
}
