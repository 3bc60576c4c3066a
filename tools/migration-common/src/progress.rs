//! Progress tracking and reporting for migrations

use std::time::{Duration, Instant};

/// Tracks rows migrated for one table against the fetched total
pub struct ProgressTracker {
    table: String,
    total_rows: u64,
    processed_rows: u64,
    points_written: u64,
    start_time: Instant,
}

impl ProgressTracker {
    /// Create a new progress tracker
    pub fn new(table: impl Into<String>, total_rows: u64) -> Self {
        Self {
            table: table.into(),
            total_rows,
            processed_rows: 0,
            points_written: 0,
            start_time: Instant::now(),
        }
    }

    /// Record a finished batch
    pub fn record_batch(&mut self, rows: u64, points: u64) {
        self.processed_rows += rows;
        self.points_written += points;
    }

    /// Rows processed so far
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.processed_rows
    }

    /// Points handed to the sink so far
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points_written
    }

    /// Time since the tracker was created
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log current progress
    pub fn report(&self) {
        let elapsed = self.start_time.elapsed();
        #[allow(clippy::cast_precision_loss)]
        let rate = if elapsed.as_secs_f64() > 0.0 {
            self.processed_rows as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        #[allow(clippy::cast_precision_loss)]
        let percentage = if self.total_rows > 0 {
            (self.processed_rows as f64 / self.total_rows as f64) * 100.0
        } else {
            100.0
        };

        tracing::info!(
            table = %self.table,
            processed = self.processed_rows,
            total = self.total_rows,
            points = self.points_written,
            percentage = format!("{percentage:.1}%"),
            rate = format!("{rate:.0} rows/sec"),
            "Migration progress"
        );
    }
}
