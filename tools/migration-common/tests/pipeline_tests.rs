//! Pipeline driver scenarios against in-memory sources and sinks

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use migration_common::{
    CountPolicy, MigrationError, MigrationPipeline, MigrationResult, PipelineOptions, RecordSink,
    Row, RowSet, RowSource, RowTransformer, TableSpec,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DATA_QUERY: &str = "select a, b from wide";
const COUNT_QUERY: &str = "select count(*) from wide";

/// Answers queries from a fixed map, recording the order they arrive in
#[derive(Default)]
struct FakeSource {
    responses: HashMap<String, RowSet>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl FakeSource {
    fn with_rows(rows: Vec<Row>, reported: u64) -> Self {
        let mut responses = HashMap::new();
        responses.insert(
            COUNT_QUERY.to_string(),
            RowSet::new(
                vec!["time".into(), "count_a".into()],
                vec![vec![json!(0), json!(reported)]],
            ),
        );
        responses.insert(
            DATA_QUERY.to_string(),
            RowSet::new(vec!["time".into(), "a".into(), "b".into()], rows),
        );
        Self {
            responses,
            seen: Arc::default(),
        }
    }
}

#[async_trait]
impl RowSource for FakeSource {
    async fn query(&self, database: &str, query: &str) -> MigrationResult<RowSet> {
        assert_eq!(database, "source_db");
        self.seen.lock().unwrap().push(query.to_string());
        self.responses
            .get(query)
            .cloned()
            .ok_or_else(|| MigrationError::query(query, "received 0 series"))
    }
}

/// Emits `(column, value)` for each value cell
struct PairTransformer;

impl RowTransformer for PairTransformer {
    type Record = (String, f64);

    fn transform(&self, columns: &[String], rows: &[Row]) -> MigrationResult<Vec<Self::Record>> {
        let mut records = Vec::new();
        for row in rows {
            for (column, value) in columns.iter().zip(row).skip(1) {
                let value = value
                    .as_f64()
                    .ok_or_else(|| MigrationError::DecodeError(value.to_string()))?;
                records.push((column.clone(), value));
            }
        }
        Ok(records)
    }
}

/// Records every write, optionally rejecting the n-th call (1-based)
#[derive(Clone, Default)]
struct RecordingSink {
    writes: Arc<Mutex<Vec<Vec<(String, f64)>>>>,
    fail_on: Option<usize>,
}

impl RecordingSink {
    fn sizes(&self) -> Vec<usize> {
        self.writes.lock().unwrap().iter().map(Vec::len).collect()
    }
}

#[async_trait]
impl RecordSink<(String, f64)> for RecordingSink {
    async fn write(&self, database: &str, records: Vec<(String, f64)>) -> MigrationResult<()> {
        assert_eq!(database, "target_db");
        let mut writes = self.writes.lock().unwrap();
        if self.fail_on == Some(writes.len() + 1) {
            return Err(MigrationError::WriteError("partial write: field type conflict".into()));
        }
        writes.push(records);
        Ok(())
    }
}

fn options(batch_size: usize) -> PipelineOptions {
    PipelineOptions {
        source_database: "source_db".to_string(),
        target_database: "target_db".to_string(),
        batch_size: NonZeroUsize::new(batch_size).unwrap(),
        count_policy: CountPolicy::Advisory,
        dry_run: false,
    }
}

fn table() -> TableSpec {
    TableSpec::new("wide", DATA_QUERY, COUNT_QUERY)
}

fn rows(n: i64) -> Vec<Row> {
    (0..n)
        .map(|i| vec![json!(1_600_000_000 + i), json!(i), json!(i as f64 + 0.5)])
        .collect()
}

#[tokio::test]
async fn batches_are_written_in_order() {
    let sink = RecordingSink::default();
    let source = FakeSource::with_rows(rows(5), 5);
    let pipeline = MigrationPipeline::new(source, PairTransformer, sink.clone(), options(2));

    let report = pipeline.run_table(&table()).await.unwrap();

    assert_eq!(sink.sizes(), vec![4, 4, 2]);
    assert_eq!(report.batches, 3);
    assert_eq!(report.points, 10);
    assert!(report.count.matches());

    let first = &sink.writes.lock().unwrap()[0];
    assert_eq!(first[0], ("a".to_string(), 0.0));
    assert_eq!(first[1], ("b".to_string(), 0.5));
}

#[tokio::test]
async fn count_query_runs_before_data_query() {
    let source = FakeSource::with_rows(rows(1), 1);
    let seen = Arc::clone(&source.seen);
    let pipeline =
        MigrationPipeline::new(source, PairTransformer, RecordingSink::default(), options(10));

    pipeline.run_table(&table()).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![COUNT_QUERY, DATA_QUERY]);
}

#[tokio::test]
async fn empty_table_never_writes() {
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(Vec::new(), 0),
        PairTransformer,
        sink.clone(),
        options(10_000),
    );

    let report = pipeline.run_table(&table()).await.unwrap();

    assert!(sink.sizes().is_empty());
    assert_eq!(report.batches, 0);
    assert_eq!(report.points, 0);
}

#[tokio::test]
async fn exact_multiple_writes_only_full_batches() {
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(rows(4), 4),
        PairTransformer,
        sink.clone(),
        options(2),
    );

    pipeline.run_table(&table()).await.unwrap();

    assert_eq!(sink.sizes(), vec![4, 4]);
}

#[tokio::test]
async fn write_failure_stops_before_next_batch() {
    let sink = RecordingSink {
        fail_on: Some(2),
        ..RecordingSink::default()
    };
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(rows(3), 3),
        PairTransformer,
        sink.clone(),
        options(1),
    );

    let err = pipeline.run_table(&table()).await.unwrap_err();

    match &err {
        MigrationError::BatchFailed {
            table,
            batch,
            total,
            ..
        } => {
            assert_eq!(table, "wide");
            assert_eq!((*batch, *total), (2, 3));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(err.root(), MigrationError::WriteError(_)));
    // batch 1 stays written, batch 3 is never attempted
    assert_eq!(sink.sizes(), vec![2]);
}

#[tokio::test]
async fn decode_failure_aborts_the_batch() {
    let mut bad = rows(3);
    bad[2][1] = Value::String("n/a".into());
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(bad, 3),
        PairTransformer,
        sink.clone(),
        options(2),
    );

    let err = pipeline.run_table(&table()).await.unwrap_err();

    assert!(matches!(err.root(), MigrationError::DecodeError(_)));
    assert_eq!(sink.sizes(), vec![4]);
}

#[tokio::test]
async fn advisory_count_mismatch_still_migrates() {
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(rows(2), 7),
        PairTransformer,
        sink.clone(),
        options(10),
    );

    let report = pipeline.run_table(&table()).await.unwrap();

    assert!(!report.count.matches());
    assert_eq!(report.count.reported_count, 7);
    assert_eq!(sink.sizes(), vec![4]);
}

#[tokio::test]
async fn strict_count_mismatch_fails_before_writing() {
    let sink = RecordingSink::default();
    let mut strict = options(10);
    strict.count_policy = CountPolicy::Strict;
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(rows(2), 7),
        PairTransformer,
        sink.clone(),
        strict,
    );

    let err = pipeline.run_table(&table()).await.unwrap_err();

    assert!(matches!(err, MigrationError::ValidationError(_)));
    assert!(err.to_string().contains(COUNT_QUERY));
    assert!(sink.sizes().is_empty());
}

#[tokio::test]
async fn unreadable_count_names_table_and_query() {
    let mut source = FakeSource::with_rows(rows(2), 2);
    source.responses.insert(
        COUNT_QUERY.to_string(),
        RowSet::new(vec!["time".into(), "count_a".into()], Vec::new()),
    );
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(source, PairTransformer, sink.clone(), options(10));

    let err = pipeline.run(&[table()]).await.unwrap_err();

    match &err {
        MigrationError::QueryError { query, .. } => assert_eq!(query, COUNT_QUERY),
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains(COUNT_QUERY));
    assert!(message.contains("wide"));
    assert!(sink.sizes().is_empty());
}

#[tokio::test]
async fn dry_run_transforms_without_writing() {
    let sink = RecordingSink::default();
    let mut dry = options(2);
    dry.dry_run = true;
    let pipeline =
        MigrationPipeline::new(FakeSource::with_rows(rows(3), 3), PairTransformer, sink.clone(), dry);

    let report = pipeline.run_table(&table()).await.unwrap();

    assert!(sink.sizes().is_empty());
    assert_eq!(report.points, 6);
    assert!(!report.written);
}

#[tokio::test]
async fn query_failure_aborts_remaining_tables() {
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(rows(1), 1),
        PairTransformer,
        sink.clone(),
        options(10),
    );
    let missing = TableSpec::new("missing", "select x from nowhere", "select count(*) from nowhere");

    let err = pipeline.run(&[missing, table()]).await.unwrap_err();

    assert!(matches!(err, MigrationError::QueryError { .. }));
    assert!(sink.sizes().is_empty());
}

#[tokio::test]
async fn run_reports_every_table() {
    let sink = RecordingSink::default();
    let pipeline = MigrationPipeline::new(
        FakeSource::with_rows(rows(3), 3),
        PairTransformer,
        sink.clone(),
        options(2),
    );

    let report = pipeline.run(&[table(), table()]).await.unwrap();

    assert_eq!(report.tables.len(), 2);
    assert_eq!(report.total_rows(), 6);
    assert_eq!(report.total_points(), 12);
    assert_eq!(sink.sizes(), vec![4, 2, 4, 2]);
}
