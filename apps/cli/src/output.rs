//! Output helpers for terminal summaries

use console::style;
use modelfetch_core::format_duration;
use modelfetch_types::TransferOutcome;

/// Print one line per finished download and return how many failed.
pub fn print_summary(outcomes: &[TransferOutcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            TransferOutcome::Completed { filename, elapsed } => {
                println!(
                    "{} {} ({})",
                    style("✓").green().bold(),
                    style(filename).cyan(),
                    format_duration(*elapsed)
                );
            }
            TransferOutcome::Failed { reason } => {
                failed += 1;
                println!("{} {}", style("✗").red().bold(), style(reason).red());
            }
        }
    }
    failed
}
