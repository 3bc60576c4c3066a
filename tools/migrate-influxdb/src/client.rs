//! HTTP client for the InfluxDB 1.x query and write endpoints

use crate::config::StoreConfig;
use crate::point::{self, Point};
use crate::response;
use async_trait::async_trait;
use migration_common::{MigrationError, MigrationResult, RecordSink, RowSet, RowSource};
use reqwest::Url;
use secrecy::ExposeSecret;
use std::time::Duration;

/// Timestamps are exchanged as epoch seconds in both directions
pub const PRECISION: &str = "s";

/// Connection to one InfluxDB instance
///
/// Used as the row source on one side of a migration and as the point sink on
/// the other. Calls are issued one at a time.
pub struct InfluxClient {
    http: reqwest::Client,
    store: StoreConfig,
    query_url: Url,
    write_url: Url,
}

impl InfluxClient {
    /// Build a client for `store`, with an optional request timeout
    pub fn new(store: StoreConfig, timeout: Option<Duration>) -> MigrationResult<Self> {
        let query_url = endpoint(&store.url, "query")?;
        let write_url = endpoint(&store.url, "write")?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            MigrationError::ConnectionError(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            http,
            store,
            query_url,
            write_url,
        })
    }

    /// Base URL of the instance
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.store.url
    }

    fn credentials(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(
            &self.store.username,
            Some(self.store.password.expose_secret()),
        )
    }
}

#[async_trait]
impl RowSource for InfluxClient {
    async fn query(&self, database: &str, query: &str) -> MigrationResult<RowSet> {
        tracing::debug!(url = %self.query_url, database, query, "Querying source");

        let request = self
            .http
            .get(self.query_url.clone())
            .query(&[("db", database), ("q", query), ("epoch", PRECISION)]);
        let response = self
            .credentials(request)
            .send()
            .await
            .map_err(|e| MigrationError::query(query, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MigrationError::query(query, e.to_string()))?;

        response::decode(query, status, &body)
    }
}

#[async_trait]
impl RecordSink<Point> for InfluxClient {
    async fn write(&self, database: &str, points: Vec<Point>) -> MigrationResult<()> {
        tracing::debug!(url = %self.write_url, database, points = points.len(), "Writing points");

        let body = point::encode_lines(&points)?;
        let request = self
            .http
            .post(self.write_url.clone())
            .query(&[("db", database), ("precision", PRECISION)])
            .body(body);
        let response = self
            .credentials(request)
            .send()
            .await
            .map_err(|e| MigrationError::WriteError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        Err(MigrationError::WriteError(format!("{status}: {reason}")))
    }
}

/// `base` with `name` appended as the last path segment
fn endpoint(base: &Url, name: &str) -> MigrationResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| MigrationError::ConnectionError(format!("'{base}' cannot be a base URL")))?
        .pop_if_empty()
        .push(name);
    Ok(url)
}
