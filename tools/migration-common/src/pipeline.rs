//! Extract-transform-load driver for wide time-series tables

use crate::batch;
use crate::error::{MigrationError, MigrationResult};
use crate::progress::ProgressTracker;
use crate::record::{Row, RowSet, TableSpec};
use crate::validator::{self, CountPolicy, CountReport};
use async_trait::async_trait;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Read side of a migration
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Run `query` against `database` and return its single series
    async fn query(&self, database: &str, query: &str) -> MigrationResult<RowSet>;
}

/// Reshapes wide rows into target records
pub trait RowTransformer: Send + Sync {
    /// Record type produced for the sink
    type Record: Send + Sync;

    /// Transform a batch of rows sharing `columns`
    ///
    /// Either every row converts or the whole batch fails.
    fn transform(&self, columns: &[String], rows: &[Row]) -> MigrationResult<Vec<Self::Record>>;
}

/// Write side of a migration
#[async_trait]
pub trait RecordSink<R: Send + 'static>: Send + Sync {
    /// Append `records` to `database` in one call
    async fn write(&self, database: &str, records: Vec<R>) -> MigrationResult<()>;
}

/// Settings shared by every table in a run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Database the rows are read from
    pub source_database: String,
    /// Database the records are written to
    pub target_database: String,
    /// Maximum rows per batch
    pub batch_size: NonZeroUsize,
    /// Treatment of count query mismatches
    pub count_policy: CountPolicy,
    /// Query and transform but never write
    pub dry_run: bool,
}

/// Migration pipeline coordinating extraction, transformation, and loading
pub struct MigrationPipeline<S, T, W> {
    source: S,
    transformer: T,
    sink: W,
    options: PipelineOptions,
}

impl<S, T, W> MigrationPipeline<S, T, W>
where
    S: RowSource,
    T: RowTransformer,
    T::Record: 'static,
    W: RecordSink<T::Record>,
{
    /// Create a new migration pipeline
    #[must_use]
    pub const fn new(source: S, transformer: T, sink: W, options: PipelineOptions) -> Self {
        Self {
            source,
            transformer,
            sink,
            options,
        }
    }

    /// Migrate every table in order, stopping at the first failure
    pub async fn run(&self, tables: &[TableSpec]) -> MigrationResult<MigrationReport> {
        let start_time = Instant::now();
        let mut reports = Vec::with_capacity(tables.len());

        for table in tables {
            reports.push(self.run_table(table).await?);
        }

        Ok(MigrationReport::new(reports, start_time.elapsed()))
    }

    /// Migrate a single table: count, fetch, batch, then transform and write
    /// each batch in turn
    pub async fn run_table(&self, table: &TableSpec) -> MigrationResult<TableReport> {
        let database = &self.options.source_database;

        tracing::info!("-------------------------------");
        tracing::info!(table = %table.name, query = %table.query, "Running with query");

        let counted = self.source.query(database, &table.count_query).await?;
        let reported = validator::reported_count(&counted).map_err(|e| {
            MigrationError::query(&table.count_query, format!("table '{}': {e}", table.name))
        })?;

        let row_set = self.source.query(database, &table.query).await?;
        tracing::debug!(
            table = %table.name,
            columns = ?row_set.value_columns(),
            rows = row_set.len(),
            "Fetched rows"
        );

        let RowSet { columns, rows } = row_set;
        let count = CountReport::new(reported, rows.len() as u64);
        count.enforce(table, self.options.count_policy)?;

        let batches = batch::split(rows, self.options.batch_size);
        let total = batches.len();
        let mut progress = ProgressTracker::new(&table.name, count.fetched_count);

        for (index, rows) in batches.into_iter().enumerate() {
            let number = index + 1;
            let tag = |source: MigrationError| MigrationError::BatchFailed {
                table: table.name.clone(),
                batch: number,
                total,
                source: Box::new(source),
            };

            tracing::info!(table = %table.name, "Converting batch {number} / {total}");
            let records = self.transformer.transform(&columns, &rows).map_err(tag)?;
            let record_count = records.len() as u64;

            if self.options.dry_run {
                tracing::warn!(
                    table = %table.name,
                    points = record_count,
                    "Dry run: skipping write of batch {number} / {total}"
                );
            } else {
                tracing::info!(table = %table.name, "Writing batch {number} / {total}");
                self.sink
                    .write(&self.options.target_database, records)
                    .await
                    .map_err(tag)?;
            }

            progress.record_batch(rows.len() as u64, record_count);
            progress.report();
        }

        Ok(TableReport {
            table: table.name.clone(),
            count,
            batches: total,
            points: progress.points(),
            written: !self.options.dry_run,
            elapsed: progress.elapsed(),
        })
    }
}

/// Outcome of migrating one table
#[derive(Debug, Clone)]
pub struct TableReport {
    /// Table name
    pub table: String,
    /// Reported vs fetched row counts
    pub count: CountReport,
    /// Number of batches processed
    pub batches: usize,
    /// Points produced
    pub points: u64,
    /// Whether points were actually written (false on dry runs)
    pub written: bool,
    /// Time spent on this table
    pub elapsed: Duration,
}

/// Report from a completed migration
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Per-table outcomes in processing order
    pub tables: Vec<TableReport>,
    /// Total time elapsed
    pub elapsed_time: Duration,
}

impl MigrationReport {
    /// Create a new migration report
    #[must_use]
    pub const fn new(tables: Vec<TableReport>, elapsed_time: Duration) -> Self {
        Self {
            tables,
            elapsed_time,
        }
    }

    /// Rows fetched across all tables
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.count.fetched_count).sum()
    }

    /// Points produced across all tables
    #[must_use]
    pub fn total_points(&self) -> u64 {
        self.tables.iter().map(|t| t.points).sum()
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\nMigration Complete!");
        println!("==================");
        for table in &self.tables {
            println!(
                "{:<10} counted {:>8}  fetched {:>8}  batches {:>5}  points {:>9}{}",
                table.table,
                table.count.reported_count,
                table.count.fetched_count,
                table.batches,
                table.points,
                if table.written { "" } else { "  (dry run)" }
            );
        }
        println!("Total rows: {}", self.total_rows());
        println!("Total points: {}", self.total_points());
        println!("Elapsed time: {:?}", self.elapsed_time);
    }
}
