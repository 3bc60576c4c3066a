//! Shared migration infrastructure for time-series stores
//!
//! Provides the store-agnostic half of a batched extract-transform-load run:
//! row sets and table specs, fixed-size batching, the source / transformer /
//! sink seams, and the sequential driver that ties them together with count
//! validation and progress reporting.

pub mod batch;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod validator;

pub use error::{MigrationError, MigrationResult};
pub use pipeline::{
    MigrationPipeline, MigrationReport, PipelineOptions, RecordSink, RowSource, RowTransformer,
    TableReport,
};
pub use progress::ProgressTracker;
pub use record::{Row, RowSet, TableSpec};
pub use validator::{CountPolicy, CountReport};
