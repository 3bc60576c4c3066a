//! Narrow per-metric points and their line protocol encoding

use chrono::{DateTime, Utc};
use influxdb_line_protocol::LineProtocolBuilder;
use migration_common::{MigrationError, MigrationResult};
use std::collections::BTreeMap;

/// Field key every point stores its value under
pub const VALUE_FIELD: &str = "value";

/// One tagged, timestamped numeric datum
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Measurement name, also carried in the `__name__` tag
    pub metric: String,
    /// Second-precision timestamp
    pub timestamp: DateTime<Utc>,
    /// Sample value
    pub value: f64,
    /// Tag set, kept sorted so encoding is deterministic
    pub tags: BTreeMap<String, String>,
}

impl Point {
    /// First measurement, tag key or tag value line protocol cannot carry
    ///
    /// A trailing backslash stays ambiguous even when escaped, so stores
    /// reject the whole line.
    #[must_use]
    pub fn unencodable(&self) -> Option<&str> {
        std::iter::once(self.metric.as_str())
            .chain(self.tags.iter().flat_map(|(k, v)| [k.as_str(), v.as_str()]))
            .find(|name| name.ends_with('\\'))
    }

    /// Tags that make it onto the line; empty keys and values are dropped
    fn encoded_tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags
            .iter()
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Encode a batch as line protocol with seconds timestamps, one line per point
pub fn encode_lines(points: &[Point]) -> MigrationResult<Vec<u8>> {
    let mut builder = LineProtocolBuilder::new();

    for point in points {
        if let Some(name) = point.unencodable() {
            return Err(MigrationError::WriteError(format!(
                "'{name}' in point '{}' ends with a backslash",
                point.metric
            )));
        }

        let mut line = builder.measurement(&point.metric);
        for (key, value) in point.encoded_tags() {
            line = line.tag(key, value);
        }
        builder = line
            .field(VALUE_FIELD, point.value)
            .timestamp(point.timestamp.timestamp())
            .close_line();
    }

    Ok(builder.build())
}
