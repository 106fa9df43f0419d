use std::collections::VecDeque;

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};

use crate::error::SqlConnectorError;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlConnectorError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlConnectorError> {
    let value: Value = row.get(idx).map_err(SqlConnectorError::SqliteError)?;
    match value {
        Value::Null => Ok(RowValues::Null),
        Value::Integer(i) => Ok(RowValues::Int(i)),
        Value::Real(f) => Ok(RowValues::Float(f)),
        Value::Text(s) => Ok(RowValues::Text(s)),
        Value::Blob(b) => Ok(RowValues::Blob(b)),
    }
}

/// A fully materialized rowset.
#[derive(Debug, Default)]
pub struct Rowset {
    pub columns: Vec<String>,
    pub rows: VecDeque<Vec<RowValues>>,
    /// Rows buffered, or rows changed for statements that return none.
    pub row_count: u64,
    /// True when the statement returned rows.
    pub returns_rows: bool,
}

/// Run one statement through the connection's statement cache and buffer its whole
/// result.
///
/// Statements without result columns are run with `execute` and report the change count,
/// which is `0` when the connection's running total did not move (DDL leaves the last DML
/// count in place); everything else is queried and every row is copied into the buffer before returning.
///
/// # Errors
/// Returns `SqlConnectorError::SqliteError` if compiling, binding or stepping fails.
pub fn run_buffered(
    conn: &Connection,
    sql: &str,
    params: &[Value],
) -> Result<Rowset, SqlConnectorError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();

    if columns.is_empty() {
        let before = conn.total_changes();
        let changed = stmt.execute(params_from_iter(params.iter()))?;
        let row_count = if conn.total_changes() == before {
            0
        } else {
            changed as u64
        };
        return Ok(Rowset {
            columns,
            rows: VecDeque::new(),
            row_count,
            returns_rows: false,
        });
    }

    let col_count = columns.len();
    let mut rows = VecDeque::new();
    let mut cursor = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value_sync(row, i)?);
        }
        rows.push_back(values);
    }

    Ok(Rowset {
        columns,
        row_count: rows.len() as u64,
        rows,
        returns_rows: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL, raw BLOB);
             INSERT INTO t (name, score, raw) VALUES ('a', 1.5, x'0102'), ('b', NULL, NULL);",
        )
        .expect("schema");
        conn
    }

    #[test]
    fn buffers_every_row_with_typed_values() {
        let conn = conn();
        let set = run_buffered(&conn, "SELECT id, name, score, raw FROM t ORDER BY id", &[])
            .expect("select");
        assert!(set.returns_rows);
        assert_eq!(set.columns, vec!["id", "name", "score", "raw"]);
        assert_eq!(set.row_count, 2);
        assert_eq!(
            set.rows[0],
            vec![
                RowValues::Int(1),
                RowValues::Text("a".into()),
                RowValues::Float(1.5),
                RowValues::Blob(vec![1, 2]),
            ]
        );
        assert!(set.rows[1][2].is_null());
    }

    #[test]
    fn dml_reports_changes() {
        let conn = conn();
        let set = run_buffered(
            &conn,
            "UPDATE t SET score = ? WHERE score IS NULL",
            &[Value::Real(2.0)],
        )
        .expect("update");
        assert!(!set.returns_rows);
        assert!(set.columns.is_empty());
        assert_eq!(set.row_count, 1);
    }

    #[test]
    fn ddl_after_dml_reports_no_changes() {
        let conn = conn();
        let set = run_buffered(&conn, "DELETE FROM t", &[]).expect("delete");
        assert_eq!(set.row_count, 2);
        let set = run_buffered(&conn, "CREATE TABLE u (b INTEGER)", &[]).expect("create");
        assert!(!set.returns_rows);
        assert_eq!(set.row_count, 0);
    }

    #[test]
    fn empty_select_still_has_columns() {
        let conn = conn();
        let set = run_buffered(&conn, "SELECT id FROM t WHERE id < 0", &[]).expect("select");
        assert!(set.returns_rows);
        assert_eq!(set.row_count, 0);
        assert_eq!(set.columns, vec!["id"]);
    }
}
