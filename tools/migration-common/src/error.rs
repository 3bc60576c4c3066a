//! Error types for migration operations

use thiserror::Error;

/// Errors that can occur during a table migration
///
/// Every variant is fatal: the pipeline never retries or skips, it hands the
/// error back to the caller which is expected to abort the run.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Malformed store URL or credentials detected at startup
    #[error("Failed to set up connection: {0}")]
    ConnectionError(String),

    /// Transport failure, store-reported error, or unexpected response shape
    #[error("Query failed ({query}): {reason}")]
    QueryError {
        /// Query text that was sent to the source store
        query: String,
        /// What went wrong
        reason: String,
    },

    /// A value that should be numeric is not
    #[error("Failed to decode value: {0}")]
    DecodeError(String),

    /// Transport failure or store-side rejection while writing
    #[error("Failed to write points: {0}")]
    WriteError(String),

    /// Configuration or count validation failure
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// A transform or write failure, tagged with the batch it happened in
    #[error("Table '{table}' batch {batch} / {total} failed: {source}")]
    BatchFailed {
        /// Logical table being migrated
        table: String,
        /// 1-based batch index
        batch: usize,
        /// Total number of batches for the table
        total: usize,
        /// Underlying failure
        #[source]
        source: Box<MigrationError>,
    },
}

impl MigrationError {
    /// Build a [`MigrationError::QueryError`] for `query`
    pub fn query(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QueryError {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Innermost error, looking through [`MigrationError::BatchFailed`]
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::BatchFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;
