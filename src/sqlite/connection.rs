use std::sync::Arc;

use async_trait::async_trait;

use crate::adapter::{DriverConnection, PreparedHandle};
use crate::config::ConnectorConfig;
use crate::error::SqlConnectorError;
use crate::script::Script;
use crate::types::DatabaseType;

use super::config::{SharedSqliteConnection, open_shared, run_blocking};
use super::prepared::SqlitePrepared;

/// Buffered-native connection: every rowset is copied into memory when its statement runs.
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
}

impl SqliteConnection {
    /// Open the configured database file.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the database cannot be opened.
    pub fn open(config: &ConnectorConfig) -> Result<Self, SqlConnectorError> {
        Ok(Self {
            conn: open_shared(config)?,
        })
    }

    async fn batch(&self, sql: &'static str) -> Result<(), SqlConnectorError> {
        run_blocking(Arc::clone(&self.conn), move |conn| {
            conn.execute_batch(sql).map_err(SqlConnectorError::SqliteError)
        })
        .await
    }
}

#[async_trait]
impl DriverConnection for SqliteConnection {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn prepare(&self, script: Script) -> Result<Box<dyn PreparedHandle>, SqlConnectorError> {
        // Compile now so syntax errors surface at prepare time; the statement stays in the
        // connection's cache for the first execute.
        let first = script.statements()[0].sql.clone();
        run_blocking(Arc::clone(&self.conn), move |conn| {
            conn.prepare_cached(&first)
                .map(|_| ())
                .map_err(SqlConnectorError::SqliteError)
        })
        .await?;
        Ok(Box::new(SqlitePrepared::new(Arc::clone(&self.conn), script)))
    }

    async fn begin(&self) -> Result<(), SqlConnectorError> {
        self.batch("BEGIN").await
    }

    async fn commit(&self) -> Result<(), SqlConnectorError> {
        self.batch("COMMIT").await
    }

    async fn rollback(&self) -> Result<(), SqlConnectorError> {
        self.batch("ROLLBACK").await
    }

    async fn last_insert_id(&self) -> Result<i64, SqlConnectorError> {
        run_blocking(Arc::clone(&self.conn), |conn| Ok(conn.last_insert_rowid())).await
    }
}
