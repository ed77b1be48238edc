//! Progress bar and summary reporting for the console run.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::format::{format_bytes, format_duration};
use crate::pipeline::PipelineProgress;
use crate::stats::RunStats;

const SEPARATOR: &str = "────────────────────────────────────────────────────────────";

/// Item-counting progress bar that prints a line per completed item.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    /// Creates a bar sized to the number of unfiled items.
    #[must_use]
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} - {msg}",
            )
            .expect("progress template is valid")
            .progress_chars("━━╌"),
        );
        Self { bar }
    }

    /// Clears the bar once the run is over.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgress for ConsoleProgress {
    fn on_item_start(&self, _index: usize, _total: usize, filename: &str) {
        self.bar.set_message(filename.to_string());
    }

    fn on_item_skipped(&self, _index: usize, _total: usize, _filename: &str) {
        self.bar.inc(1);
    }

    fn on_item_complete(&self, index: usize, total: usize, filename: &str, bytes: u64) {
        self.bar
            .println(format!("  [{index}/{total}] {filename} ({})", format_bytes(bytes)));
        self.bar.inc(1);
    }

    fn on_item_error(&self, index: usize, total: usize, filename: &str, error: &str) {
        self.bar
            .println(format!("  [{index}/{total}] ERROR {filename}: {error}"));
        self.bar.inc(1);
    }
}

/// Prints the end-of-run summary.
pub fn print_summary(stats: &RunStats, archive_path: &Path) {
    println!("\n{SEPARATOR}");
    println!("Download Summary");
    println!("{SEPARATOR}");

    if stats.downloaded > 0 {
        println!("  Items downloaded:  {}", stats.downloaded);
        println!("  Total size:        {}", format_bytes(stats.total_bytes));
        println!("  Total time:        {}", format_duration(stats.elapsed));
        println!("  Average speed:     {}/s", format_bytes(stats.average_speed()));
    }
    if stats.skipped > 0 {
        println!("  Items skipped:     {} (archived in a previous run)", stats.skipped);
    }
    if stats.failed > 0 {
        println!("  Items failed:      {} (will be retried next run)", stats.failed);
    }
    println!("  Archive:           {}", archive_path.display());
    println!("{SEPARATOR}");
}
