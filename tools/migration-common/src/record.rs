//! Tabular records flowing out of a source store

use serde_json::Value;

/// One wide row: a timestamp in position 0 followed by value columns
pub type Row = Vec<Value>;

/// Result of one source query: column names plus ordered rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column names, `columns[0]` is always the time column
    pub columns: Vec<String>,
    /// Rows in store order, each with exactly `columns.len()` values
    pub rows: Vec<Row>,
}

impl RowSet {
    /// Create a row set from columns and rows
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set holds no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value columns, i.e. every column but the leading time column
    #[must_use]
    pub fn value_columns(&self) -> &[String] {
        self.columns.get(1..).unwrap_or_default()
    }
}

/// One logical source table to migrate
///
/// Table specs are built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// Name used in logs and reports
    pub name: String,
    /// Query returning the rows to migrate
    pub query: String,
    /// Query returning the number of rows `query` should yield
    pub count_query: String,
}

impl TableSpec {
    /// Create a new table spec
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        count_query: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            count_query: count_query.into(),
        }
    }
}
