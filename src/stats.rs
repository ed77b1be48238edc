//! Per-run download counters.

use std::time::{Duration, Instant};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Items downloaded and archived this run.
    pub downloaded: usize,
    /// Items skipped because they were archived in a previous run.
    pub skipped: usize,
    /// Items that failed and will be retried on the next run.
    pub failed: usize,
    /// Total bytes appended to the archive.
    pub total_bytes: u64,
    /// Wall-clock time for the run.
    pub elapsed: Duration,
}

impl RunStats {
    /// Average throughput in bytes per second.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn average_speed(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.total_bytes as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Accumulates counters while the pipeline runs.
pub struct RunStatsBuilder {
    downloaded: usize,
    skipped: usize,
    failed: usize,
    total_bytes: u64,
    start_time: Instant,
}

impl Default for RunStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatsBuilder {
    /// Starts the clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            downloaded: 0,
            skipped: 0,
            failed: 0,
            total_bytes: 0,
            start_time: Instant::now(),
        }
    }

    /// Records a completed download of `bytes` bytes.
    pub const fn add_download(&mut self, bytes: u64) {
        self.downloaded += 1;
        self.total_bytes += bytes;
    }

    /// Records an item skipped via the resume set.
    pub const fn add_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Records a failed item.
    pub const fn add_failure(&mut self) {
        self.failed += 1;
    }

    /// Finalizes the counters.
    #[must_use]
    pub fn build(self) -> RunStats {
        RunStats {
            downloaded: self.downloaded,
            skipped: self.skipped,
            failed: self.failed,
            total_bytes: self.total_bytes,
            elapsed: self.start_time.elapsed(),
        }
    }
}
