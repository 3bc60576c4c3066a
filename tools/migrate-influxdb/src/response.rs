//! InfluxDB 1.x `/query` response envelope

use migration_common::{MigrationError, MigrationResult, Row, RowSet};
use reqwest::StatusCode;
use serde::Deserialize;

/// Top-level `/query` body
#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of one statement in the query
#[derive(Debug, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: u32,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One series: a measurement's columns and rows
#[derive(Debug, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Row>,
}

impl QueryResponse {
    /// Unwrap to the single series this migration expects
    ///
    /// Anything other than exactly one result holding exactly one series is
    /// rejected rather than partially interpreted.
    pub fn into_row_set(self, query: &str) -> MigrationResult<RowSet> {
        if let Some(error) = self.error {
            return Err(MigrationError::query(query, error));
        }

        let [result]: [StatementResult; 1] = self.results.try_into().map_err(|results: Vec<_>| {
            MigrationError::query(query, format!("received {} results", results.len()))
        })?;

        if let Some(error) = result.error {
            return Err(MigrationError::query(query, error));
        }

        let series_count = result.series.len();
        let [series]: [Series; 1] = result.series.try_into().map_err(|_| {
            MigrationError::query(
                query,
                format!("received {series_count} series in the first result"),
            )
        })?;

        if let Some(row) = series.values.iter().position(|r| r.len() != series.columns.len()) {
            return Err(MigrationError::query(
                query,
                format!(
                    "row {row} has {} values for {} columns",
                    series.values[row].len(),
                    series.columns.len()
                ),
            ));
        }

        Ok(RowSet::new(series.columns, series.values))
    }
}

/// Decode a raw `/query` HTTP reply
pub fn decode(query: &str, status: StatusCode, body: &str) -> MigrationResult<RowSet> {
    match serde_json::from_str::<QueryResponse>(body) {
        Ok(response) if status.is_success() => response.into_row_set(query),
        Ok(QueryResponse {
            error: Some(error), ..
        }) => Err(MigrationError::query(query, format!("{status}: {error}"))),
        Ok(_) => Err(MigrationError::query(query, status.to_string())),
        Err(_) if !status.is_success() => Err(MigrationError::query(
            query,
            format!("{status}: {}", body.trim()),
        )),
        Err(e) => Err(MigrationError::query(
            query,
            format!("malformed response: {e}"),
        )),
    }
}
