//! Compiled-in nest tables and the tags every migrated point carries

use migration_common::TableSpec;
use std::collections::BTreeMap;

/// Trailing window every run re-reads
pub const LOOKBACK: &str = "10h";

/// `inside` source column to target metric
pub const INSIDE_COLUMNS: &[(&str, &str)] = &[
    ("has_leaf", "nest_leaf"),
    ("humidity", "nest_humidity"),
    ("is_heating", "nest_heating"),
    ("target", "nest_target_temp"),
    ("temperature", "nest_current_temp"),
];

/// `outside` source column to target metric
pub const OUTSIDE_COLUMNS: &[(&str, &str)] = &[
    ("humidity", "nest_weather_humidity"),
    ("pressure", "nest_weather_pressure"),
    ("temperature", "nest_weather_temp"),
];

/// Tags identifying the exporter the migrated series would have come from
pub const DEFAULT_TAGS: &[(&str, &str)] = &[
    ("job", "pronestheus"),
    ("instance", "pronestheus:2112"),
    ("name", "Living-Room"),
    ("id", "JyHyG8n7kBXBV0_KHqQhNsmUnpmzy3o_"),
];

/// Default tag set as an owned map
#[must_use]
pub fn default_tags() -> BTreeMap<String, String> {
    DEFAULT_TAGS
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Build a table spec selecting `columns` renamed to their metric names
#[must_use]
pub fn table_spec(table: &str, columns: &[(&str, &str)]) -> TableSpec {
    let selection = columns
        .iter()
        .map(|(column, metric)| format!("{column} as {metric}"))
        .collect::<Vec<_>>()
        .join(", ");
    let window = format!("where time > now() -{LOOKBACK}");

    TableSpec::new(
        table,
        format!("select {selection} from {table} {window}"),
        format!("select count(*) from {table} {window}"),
    )
}

/// The tables migrated by every run, in processing order
#[must_use]
pub fn nest_tables() -> Vec<TableSpec> {
    vec![
        table_spec("inside", INSIDE_COLUMNS),
        table_spec("outside", OUTSIDE_COLUMNS),
    ]
}
