use serde::Serialize;

use super::row::Row;

/// Shaped output of a one-shot query.
///
/// Which variant comes back is decided by the query's [`ResultFlags`](crate::ResultFlags):
/// `ManyRows` always yields [`QueryResult::Rows`], `OneRow` yields [`QueryResult::Row`],
/// `Auto` picks based on the size of the first rowset.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Row(Row),
    Rows(Vec<Row>),
}

impl QueryResult {
    #[must_use]
    pub fn as_row(&self) -> Option<&Row> {
        match self {
            QueryResult::Row(row) => Some(row),
            QueryResult::Rows(_) => None,
        }
    }

    #[must_use]
    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Row(_) => None,
        }
    }

    #[must_use]
    pub fn into_row(self) -> Option<Row> {
        match self {
            QueryResult::Row(row) => Some(row),
            QueryResult::Rows(_) => None,
        }
    }

    #[must_use]
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            QueryResult::Rows(rows) => Some(rows),
            QueryResult::Row(_) => None,
        }
    }

    /// Number of rows carried: 1 for a single row.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Row(_) => 1,
            QueryResult::Rows(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
