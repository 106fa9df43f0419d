#![allow(dead_code)]

use sql_connector::prelude::*;

/// Every backend compiled into this build.
pub fn backends() -> Vec<DatabaseType> {
    vec![
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite,
        #[cfg(feature = "turso")]
        DatabaseType::Turso,
    ]
}

/// A connector on a fresh in-memory database.
pub fn memory_connector(db_type: DatabaseType) -> Result<Connector, SqlConnectorError> {
    ConnectorConfig::builder(db_type, ":memory:").build()
}

pub const BANLIST_SCHEMA: &str = "CREATE TABLE banlist (
    id INTEGER PRIMARY KEY,
    uuid TEXT NOT NULL UNIQUE,
    reason TEXT,
    modified TEXT,
    deleted INTEGER NOT NULL DEFAULT 0
)";

/// In-memory connector with a ban list holding `n` active rows (`u0`, `u1`, ...).
pub async fn banlist_connector(
    db_type: DatabaseType,
    n: usize,
) -> Result<Connector, SqlConnectorError> {
    let connector = memory_connector(db_type)?;
    connector.try_exec(BANLIST_SCHEMA, &[]).await?;
    for i in 0..n {
        connector
            .try_exec(
                "INSERT INTO banlist (uuid, reason) VALUES (?, ?)",
                &[
                    RowValues::Text(format!("u{i}")),
                    RowValues::Text("griefing".into()),
                ],
            )
            .await?;
    }
    Ok(connector)
}

pub fn text_of(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(RowValues::as_text).map(str::to_string)
}
