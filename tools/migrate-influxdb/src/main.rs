//! InfluxDB nest table migration tool

use anyhow::Result;
use clap::Parser;
use migrate_influxdb::{Args, MigrationConfig, tables};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    tracing::info!("Starting nest table migration");

    let result = match MigrationConfig::from_args(args) {
        Ok(config) => migrate_influxdb::run(config, &tables::nest_tables()).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(report) => {
            report.print_summary();
            tracing::info!("Migration completed successfully");
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "Migration aborted");
            Err(err.into())
        }
    }
}
