use crate::error::SqlConnectorError;
use crate::types::RowValues;

/// Column names of a compiled statement; empty for statements that return no rows.
pub fn column_names(stmt: &turso::Statement) -> Vec<String> {
    stmt.columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect()
}

/// Convert a Turso value into a `RowValues`.
#[must_use]
pub fn turso_value_to_row_value(value: turso::Value) -> RowValues {
    match value {
        turso::Value::Null => RowValues::Null,
        turso::Value::Integer(i) => RowValues::Int(i),
        turso::Value::Real(f) => RowValues::Float(f),
        turso::Value::Text(s) => RowValues::Text(s),
        turso::Value::Blob(b) => RowValues::Blob(b),
    }
}

/// Read every column of a fetched row.
///
/// # Errors
/// Returns `SqlConnectorError::TursoError` if a value cannot be read.
pub fn read_row(row: &turso::Row) -> Result<Vec<RowValues>, SqlConnectorError> {
    let mut values = Vec::with_capacity(row.column_count());
    for idx in 0..row.column_count() {
        values.push(turso_value_to_row_value(row.get_value(idx)?));
    }
    Ok(values)
}

/// Fetch the next row from a live cursor.
///
/// # Errors
/// Returns `SqlConnectorError::TursoError` if stepping the cursor fails.
pub async fn fetch_row(
    rows: &mut turso::Rows,
) -> Result<Option<Vec<RowValues>>, SqlConnectorError> {
    let next = rows.next().await?;
    next.as_ref().map(read_row).transpose()
}

/// Run a single-row, integer-only query against the connection.
async fn query_ints(
    conn: &turso::Connection,
    sql: &str,
) -> Result<Vec<i64>, SqlConnectorError> {
    let mut rows = conn.query(sql, ()).await?;
    let values = fetch_row(&mut rows).await?.unwrap_or_default();
    Ok(values
        .iter()
        .map(|value| value.as_int().copied().unwrap_or(0))
        .collect())
}

/// The connection's running total of rows changed by DML.
///
/// # Errors
/// Returns `SqlConnectorError::TursoError` if the counter cannot be read.
pub async fn total_changes(conn: &turso::Connection) -> Result<i64, SqlConnectorError> {
    let values = query_ints(conn, "SELECT total_changes()").await?;
    Ok(values.first().copied().unwrap_or(0))
}

/// Rows changed by the statement that just ran on `conn`.
///
/// The library's own per-statement count misses multi-row inserts, and `changes()` keeps
/// the previous DML count across DDL, so a statement only counts when the running total
/// moved past `before`.
///
/// # Errors
/// Returns `SqlConnectorError::TursoError` if the counters cannot be read.
pub async fn changes_since(
    conn: &turso::Connection,
    before: i64,
) -> Result<u64, SqlConnectorError> {
    let values = query_ints(conn, "SELECT changes(), total_changes()").await?;
    let (changes, total) = match values.as_slice() {
        [changes, total, ..] => (*changes, *total),
        _ => (0, before),
    };
    if total == before {
        return Ok(0);
    }
    Ok(u64::try_from(changes).unwrap_or(0))
}

/// Id of the most recently inserted row, `0` if none.
///
/// # Errors
/// Returns `SqlConnectorError::TursoError` if the query fails.
pub async fn last_insert_rowid(conn: &turso::Connection) -> Result<i64, SqlConnectorError> {
    let values = query_ints(conn, "SELECT last_insert_rowid()").await?;
    Ok(values.first().copied().unwrap_or(0))
}
