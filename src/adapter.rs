//! Seams between the shared connector/statement layer and a concrete client library.
//!
//! Adapters only implement primitives: open a connection, compile a script, bind and
//! run one statement, hand out rows, advance to the next rowset, release the cursor. The
//! statement state machine, the shaping policy and the sentinel error policy live above
//! this line and are identical for every backend.

use async_trait::async_trait;

use crate::config::ConnectorConfig;
use crate::diagnostics::Step;
use crate::error::SqlConnectorError;
use crate::results::ColumnSet;
use crate::script::Script;
use crate::types::{DatabaseType, RowValues};

/// One live connection to a backend.
#[async_trait]
pub trait DriverConnection: Send + Sync {
    fn db_type(&self) -> DatabaseType;

    /// Compile the first statement of `script` and return a reusable handle.
    async fn prepare(&self, script: Script) -> Result<Box<dyn PreparedHandle>, SqlConnectorError>;

    async fn begin(&self) -> Result<(), SqlConnectorError>;

    async fn commit(&self) -> Result<(), SqlConnectorError>;

    async fn rollback(&self) -> Result<(), SqlConnectorError>;

    /// Row id of the most recent successful insert, `0` if none.
    async fn last_insert_id(&self) -> Result<i64, SqlConnectorError>;
}

/// A compiled script bound to one connection.
///
/// Callers guarantee ordering: `execute`, then any of the fetch calls and `next_rowset`,
/// then `close_cursor` before the next `execute`.
#[async_trait]
pub trait PreparedHandle: Send {
    /// Bind `params` across the script and run its first statement, opening its rowset.
    async fn execute(&mut self, params: &[RowValues]) -> Result<(), SqlConnectorError>;

    /// Columns of the current rowset (empty for statements that return no rows).
    fn columns(&self) -> ColumnSet;

    /// Next row of the current rowset, `None` once it is exhausted.
    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlConnectorError>;

    /// Rows in the current rowset, or rows affected when it returns none.
    async fn row_count(&mut self) -> Result<u64, SqlConnectorError>;

    /// Release the current rowset and run the next statement. `false` when none remain.
    async fn next_rowset(&mut self) -> Result<bool, SqlConnectorError>;

    /// Release any open cursor or buffer without running the remaining statements.
    fn close_cursor(&mut self) -> Result<(), SqlConnectorError>;

    /// Primitive calls recorded since the last take.
    fn take_steps(&mut self) -> Vec<Step>;
}

/// Open a connection for `config.db_type`.
///
/// # Errors
/// Returns `SqlConnectorError::ConnectionError` if the backend cannot be opened.
pub(crate) async fn connect(
    config: &ConnectorConfig,
) -> Result<Box<dyn DriverConnection>, SqlConnectorError> {
    match config.db_type {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => {
            let conn = crate::sqlite::SqliteConnection::open(config)?;
            Ok(Box::new(conn))
        }
        #[cfg(feature = "turso")]
        DatabaseType::Turso => {
            let conn = crate::turso::TursoConnection::open(config).await?;
            Ok(Box::new(conn))
        }
    }
}
