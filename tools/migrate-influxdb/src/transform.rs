//! Wide row to tagged point transformation

use crate::point::Point;
use chrono::{DateTime, Utc};
use migration_common::{MigrationError, MigrationResult, Row, RowTransformer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tag Prometheus reads the metric name from
pub const NAME_TAG: &str = "__name__";

/// Turns each value column of a row into its own point
///
/// Every point carries the default tag set plus `__name__` set to the
/// column name. Points come out row by row, columns left to right.
#[derive(Debug, Clone)]
pub struct PointTransformer {
    default_tags: BTreeMap<String, String>,
}

impl PointTransformer {
    /// Create a transformer applying `default_tags` to every point
    #[must_use]
    pub const fn new(default_tags: BTreeMap<String, String>) -> Self {
        Self { default_tags }
    }

    fn point(
        &self,
        metric: &str,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> MigrationResult<Point> {
        let mut tags = self.default_tags.clone();
        tags.insert(NAME_TAG.to_string(), metric.to_string());

        let point = Point {
            metric: metric.to_string(),
            timestamp,
            value,
            tags,
        };
        if let Some(name) = point.unencodable() {
            return Err(MigrationError::DecodeError(format!(
                "'{name}' cannot be written as line protocol"
            )));
        }
        Ok(point)
    }
}

impl RowTransformer for PointTransformer {
    type Record = Point;

    fn transform(&self, columns: &[String], rows: &[Row]) -> MigrationResult<Vec<Point>> {
        let mut points = Vec::with_capacity(rows.len() * columns.len().saturating_sub(1));

        for row in rows {
            let Some(time) = row.first().filter(|_| row.len() == columns.len()) else {
                return Err(MigrationError::DecodeError(format!(
                    "row has {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            };

            let timestamp = decode_timestamp(time)?;

            // columns[0] is the time column
            for (column, value) in columns.iter().zip(row).skip(1) {
                let value = decode_value(column, value)?;
                points.push(self.point(column, timestamp, value)?);
            }
        }

        Ok(points)
    }
}

/// Decode epoch seconds, dropping any sub-second fraction
#[allow(clippy::cast_possible_truncation)]
pub fn decode_timestamp(value: &Value) -> MigrationResult<DateTime<Utc>> {
    let seconds = match value.as_i64() {
        Some(seconds) => seconds,
        None => value
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| f.trunc() as i64)
            .ok_or_else(|| {
                MigrationError::DecodeError(format!("timestamp {value} is not epoch seconds"))
            })?,
    };

    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        MigrationError::DecodeError(format!("timestamp {seconds} is out of range"))
    })
}

/// Decode a numeric cell as a float
pub fn decode_value(column: &str, value: &Value) -> MigrationResult<f64> {
    value.as_f64().ok_or_else(|| {
        MigrationError::DecodeError(format!("column '{column}' value {value} is not numeric"))
    })
}
