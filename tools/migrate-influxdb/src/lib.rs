//! Wide-row InfluxDB to Prometheus-compatible point migration
//!
//! Reads the nest `inside` and `outside` tables from a source InfluxDB,
//! turns every value column of every row into its own tagged point, and
//! writes the points to a target InfluxDB in bounded batches.

pub mod client;
pub mod config;
pub mod point;
pub mod response;
pub mod tables;
pub mod transform;

pub use client::InfluxClient;
pub use config::{Args, MigrationConfig, StoreConfig};
pub use point::Point;
pub use transform::PointTransformer;

use migration_common::{MigrationPipeline, MigrationReport, MigrationResult, TableSpec};

/// Migrate `tables` with the given configuration
///
/// Tables are processed one after another and the first failure ends the
/// run; batches written before it stay written.
pub async fn run(
    config: MigrationConfig,
    tables: &[TableSpec],
) -> MigrationResult<MigrationReport> {
    let options = config.pipeline_options();
    let source = InfluxClient::new(config.source, config.timeout)?;
    let target = InfluxClient::new(config.target, config.timeout)?;

    tracing::info!(url = %source.url(), database = %options.source_database, "Source");
    tracing::info!(url = %target.url(), database = %options.target_database, "Target");
    tracing::info!(
        batch_size = options.batch_size.get(),
        dry_run = options.dry_run,
        "Batch size"
    );

    let transformer = PointTransformer::new(tables::default_tags());
    let pipeline = MigrationPipeline::new(source, transformer, target, options);

    pipeline.run(tables).await
}
