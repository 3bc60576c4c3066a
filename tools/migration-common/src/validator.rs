//! Row count cross-checks between a count query and the fetched data

use crate::error::{MigrationError, MigrationResult};
use crate::record::{RowSet, TableSpec};

/// How a count mismatch is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountPolicy {
    /// Log a warning and carry on
    #[default]
    Advisory,
    /// Abort the run with a validation error
    Strict,
}

/// Count validation report for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountReport {
    /// Row count reported by the count query
    pub reported_count: u64,
    /// Rows actually returned by the data query
    pub fetched_count: u64,
}

impl CountReport {
    /// Create a new count report
    #[must_use]
    pub const fn new(reported_count: u64, fetched_count: u64) -> Self {
        Self {
            reported_count,
            fetched_count,
        }
    }

    /// Whether both counts agree
    #[must_use]
    pub const fn matches(&self) -> bool {
        self.reported_count == self.fetched_count
    }

    /// Apply `policy` to this report, logging the outcome
    pub fn enforce(&self, table: &TableSpec, policy: CountPolicy) -> MigrationResult<()> {
        tracing::info!(
            table = %table.name,
            counted = self.reported_count,
            received = self.fetched_count,
            "Query counted {} rows and received {} rows",
            self.reported_count,
            self.fetched_count
        );

        if self.matches() {
            return Ok(());
        }

        match policy {
            CountPolicy::Advisory => {
                tracing::warn!(
                    table = %table.name,
                    counted = self.reported_count,
                    received = self.fetched_count,
                    "Row count mismatch"
                );
                Ok(())
            }
            CountPolicy::Strict => Err(MigrationError::ValidationError(format!(
                "table '{}' counted {} rows but received {} ({})",
                table.name, self.reported_count, self.fetched_count, table.count_query
            ))),
        }
    }
}

/// Extract the reported count from a count query result
///
/// Count queries answer with a single row of `[time, count, ...]`; the count
/// lives in column 1 of the first row.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn reported_count(count_result: &RowSet) -> MigrationResult<u64> {
    let value = count_result
        .rows
        .first()
        .and_then(|row| row.get(1))
        .ok_or_else(|| {
            MigrationError::DecodeError("count query returned no count column".to_string())
        })?;

    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        })
        .ok_or_else(|| MigrationError::DecodeError(format!("count {value} is not a row count")))
}
