//! Throughput tracking for the walk loop.
//!
//! [`ThroughputTracker`] owns the walker's counters and report timestamps:
//! reads seen, reads processed, and the values both had at the last status
//! report. The walker asks it whether a report is due (every `interval`-th
//! read, checked against the pre-increment count) and it computes reads/sec
//! over the wall-clock window since the previous report.
//!
//! The first boundary crossing only arms the timing baseline; rates are
//! reported from the second crossing on. The tracker is single-writer by
//! design, matching the walker's single-threaded loop.

use std::time::Instant;

/// Rates covered by one status report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputReport {
    /// Reads pulled from the source per second since the last report.
    pub reads_per_sec: f64,
    /// Reads surviving the filter per second since the last report.
    pub processed_per_sec: f64,
}

/// Counters and report timestamps for one walk.
#[derive(Debug)]
pub struct ThroughputTracker {
    interval: u64,
    reads_seen: u64,
    reads_seen_at_last_report: u64,
    reads_processed: u64,
    reads_processed_at_last_report: u64,
    last_report: Option<Instant>,
}

impl ThroughputTracker {
    /// Creates a tracker reporting every `interval` reads.
    ///
    /// # Panics
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn new(interval: u64) -> Self {
        assert!(interval > 0, "report interval must be positive");
        Self {
            interval,
            reads_seen: 0,
            reads_seen_at_last_report: 0,
            reads_processed: 0,
            reads_processed_at_last_report: 0,
            last_report: None,
        }
    }

    /// Whether a status report is due for the read about to be counted.
    ///
    /// Checked against the pre-increment count, so the very first read arms
    /// the baseline (see [`ThroughputTracker::take_report`]) and reports fire
    /// as the count crosses each interval boundary thereafter.
    #[must_use]
    pub fn report_due(&self) -> bool {
        self.reads_seen.is_multiple_of(self.interval)
    }

    /// Counts one read pulled from the source.
    pub fn count_seen(&mut self) {
        self.reads_seen += 1;
    }

    /// Counts one read that survived the filter.
    pub fn count_processed(&mut self) {
        self.reads_processed += 1;
    }

    /// Produces the rates since the previous report and resets the baseline.
    ///
    /// Returns `None` on the first call (nothing to rate yet); that call
    /// records the timing baseline for the next window.
    pub fn take_report(&mut self) -> Option<ThroughputReport> {
        let now = Instant::now();
        let report = self.last_report.map(|last| {
            let secs = now.duration_since(last).as_secs_f64().max(f64::MIN_POSITIVE);
            #[allow(clippy::cast_precision_loss)]
            ThroughputReport {
                reads_per_sec: (self.reads_seen - self.reads_seen_at_last_report) as f64 / secs,
                processed_per_sec: (self.reads_processed - self.reads_processed_at_last_report)
                    as f64
                    / secs,
            }
        });

        self.reads_seen_at_last_report = self.reads_seen;
        self.reads_processed_at_last_report = self.reads_processed;
        self.last_report = Some(now);

        report
    }

    /// Total reads pulled from the source.
    #[must_use]
    pub fn reads_seen(&self) -> u64 {
        self.reads_seen
    }

    /// Total reads that survived the filter.
    #[must_use]
    pub fn reads_processed(&self) -> u64 {
        self.reads_processed
    }
}
