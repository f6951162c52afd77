use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

use crate::model::SamplingWindow;

#[derive(Clone, PartialEq, Debug)]
pub struct ProgressReport {
    pub total_inserted: u64,
    pub position: DateTime<Utc>,
    pub date_progress_percent: f64,
    pub elapsed: Duration,
    pub docs_per_second: f64,
    pub estimated_remaining: Duration,
}

impl ProgressReport {
    /// The time remaining is extrapolated from the reporting worker's own progress through
    /// its date range, not from global progress.
    pub fn compute(
        total_inserted: u64,
        position: DateTime<Utc>,
        window: &SamplingWindow,
        elapsed: Duration,
    ) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        let docs_per_second = if elapsed_seconds > 0.0 {
            total_inserted as f64 / elapsed_seconds
        } else {
            0.0
        };

        let date_progress_percent = window.fraction_elapsed(position) * 100.0;
        let remaining_seconds = if date_progress_percent > 0.0 {
            (elapsed_seconds / date_progress_percent * 100.0 - elapsed_seconds).max(0.0)
        } else {
            0.0
        };

        Self {
            total_inserted,
            position,
            date_progress_percent,
            elapsed,
            docs_per_second,
            estimated_remaining: Duration::from_secs_f64(remaining_seconds),
        }
    }

    pub fn log(&self) {
        info!(
            total_inserted = self.total_inserted,
            position = %self.position.format("%Y-%m-%d %H:%M"),
            date_progress_percent = round_tenth(self.date_progress_percent),
            elapsed_seconds = round_tenth(self.elapsed.as_secs_f64()),
            docs_per_second = round_tenth(self.docs_per_second),
            estimated_remaining_minutes = round_tenth(self.estimated_remaining.as_secs_f64() / 60.0),
            "Progress update"
        );
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Shared across all device workers; the only mutable state that crosses worker boundaries.
#[derive(Debug)]
pub struct ProgressAggregator {
    total_inserted: AtomicU64,
    started_at: Instant,
    report_frequency: u64,
}

impl ProgressAggregator {
    pub fn new(report_frequency: u64) -> Self {
        Self {
            total_inserted: AtomicU64::new(0),
            started_at: Instant::now(),
            report_frequency: report_frequency.max(1),
        }
    }

    pub fn total_inserted(&self) -> u64 {
        self.total_inserted.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Records a successful flush of `count` readings and returns a report when this
    /// increment carried the global counter across a multiple of the report frequency.
    pub fn record_inserted(
        &self,
        count: u64,
        position: DateTime<Utc>,
        window: &SamplingWindow,
    ) -> Option<ProgressReport> {
        if count == 0 {
            return None;
        }

        let updated = self.total_inserted.fetch_add(count, Ordering::SeqCst) + count;

        if crossed_boundary(updated, count, self.report_frequency) {
            Some(ProgressReport::compute(
                updated,
                position,
                window,
                self.elapsed(),
            ))
        } else {
            None
        }
    }
}

/// Fires when this increment carried the counter across a multiple of `frequency`. With
/// disjoint `fetch_add` increments every boundary is crossed by exactly one flush, so unlike a
/// "within one batch below the boundary" test no report is duplicated or skipped, and a final
/// partial flush reports when it crosses a boundary too.
fn crossed_boundary(updated: u64, added: u64, frequency: u64) -> bool {
    added >= frequency || updated % frequency < added
}
