//! Progress spinner for batch runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use disclosure_scraper::BatchStats;
use indicatif::{ProgressBar, ProgressStyle};

/// Spawns the spinner when requested.
///
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    stats: Arc<BatchStats>,
    total: usize,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let signal = Arc::clone(&stop);
    let handle = tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !signal.load(Ordering::SeqCst) {
            spinner.set_message(format!(
                "[{}/{}] scraping ({} failed)",
                stats.finished().min(total),
                total,
                stats.failed()
            ));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }
        spinner.finish_and_clear();
    });
    (Some(handle), stop)
}
