use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::config::ConnectorConfig;
use crate::error::SqlConnectorError;

/// One rusqlite connection shared by the connector and every statement it prepared.
pub type SharedSqliteConnection = Arc<Mutex<Connection>>;

const IN_MEMORY: &str = ":memory:";

/// Open the database named by `config.database`.
///
/// File databases are switched to WAL journaling.
///
/// # Errors
/// Returns `SqlConnectorError::ConnectionError` if the file cannot be opened.
pub fn open_shared(config: &ConnectorConfig) -> Result<SharedSqliteConnection, SqlConnectorError> {
    let path = config.database.as_str();
    let conn = if path == IN_MEMORY {
        Connection::open_in_memory()
    } else {
        Connection::open(path)
    }
    .map_err(|e| SqlConnectorError::ConnectionError(format!("Failed to open SQLite database: {e}")))?;

    if path != IN_MEMORY {
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(SqlConnectorError::SqliteError)?;
    }
    debug!(database = path, "sqlite connection opened");

    Ok(Arc::new(Mutex::new(conn)))
}

/// Run a closure against the connection on the blocking thread pool.
///
/// # Errors
/// Returns the closure's error, or `SqlConnectorError::ExecutionError` if the blocking task
/// could not be joined.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlConnectorError>
where
    F: FnOnce(&mut Connection) -> Result<R, SqlConnectorError> + Send + 'static,
    R: Send + 'static,
{
    spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlConnectorError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
