use tracing::debug;

use crate::config::ConnectorConfig;
use crate::error::SqlConnectorError;

/// Open the local database named by `config.database` and connect to it.
///
/// # Errors
/// Returns `SqlConnectorError::ConnectionError` if the database cannot be created or
/// connected.
pub async fn open_local(
    config: &ConnectorConfig,
) -> Result<(turso::Database, turso::Connection), SqlConnectorError> {
    let db_path = config.database.as_str();
    let db = turso::Builder::new_local(db_path)
        .build()
        .await
        .map_err(|e| {
            SqlConnectorError::ConnectionError(format!("Failed to create Turso database: {e}"))
        })?;

    let conn = db.connect().map_err(|e| {
        SqlConnectorError::ConnectionError(format!("Failed to connect Turso database: {e}"))
    })?;

    // Best-effort; in-memory databases do not support WAL.
    let _ = conn.execute("PRAGMA journal_mode = WAL", ()).await;
    debug!(database = db_path, "turso connection opened");

    Ok((db, conn))
}
