use async_trait::async_trait;

use crate::adapter::{DriverConnection, PreparedHandle};
use crate::config::ConnectorConfig;
use crate::error::SqlConnectorError;
use crate::script::Script;
use crate::types::DatabaseType;

use super::config::open_local;
use super::prepared::TursoPrepared;
use super::query::last_insert_rowid;

/// Library-managed connection: the Turso client owns cursors and statement state.
pub struct TursoConnection {
    // Keeps the database alive for as long as the connection is used.
    _db: turso::Database,
    conn: turso::Connection,
}

impl TursoConnection {
    /// Open the configured local database.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConnectionError` if the database cannot be opened.
    pub async fn open(config: &ConnectorConfig) -> Result<Self, SqlConnectorError> {
        let (db, conn) = open_local(config).await?;
        Ok(Self { _db: db, conn })
    }

    async fn run(&self, sql: &str) -> Result<(), SqlConnectorError> {
        self.conn.execute(sql, ()).await?;
        Ok(())
    }
}

#[async_trait]
impl DriverConnection for TursoConnection {
    fn db_type(&self) -> DatabaseType {
        DatabaseType::Turso
    }

    async fn prepare(&self, script: Script) -> Result<Box<dyn PreparedHandle>, SqlConnectorError> {
        let prepared = TursoPrepared::prepare(self.conn.clone(), script).await?;
        Ok(Box::new(prepared))
    }

    async fn begin(&self) -> Result<(), SqlConnectorError> {
        self.run("BEGIN").await
    }

    async fn commit(&self) -> Result<(), SqlConnectorError> {
        self.run("COMMIT").await
    }

    async fn rollback(&self) -> Result<(), SqlConnectorError> {
        self.run("ROLLBACK").await
    }

    async fn last_insert_id(&self) -> Result<i64, SqlConnectorError> {
        last_insert_rowid(&self.conn).await
    }
}
