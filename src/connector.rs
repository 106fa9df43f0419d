use serde_json::{Value as JsonValue, json};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::adapter::{self, DriverConnection, PreparedHandle};
use crate::config::ConnectorConfig;
use crate::diagnostics::{LogEntry, SharedLog, Step, StepLog, payload};
use crate::error::SqlConnectorError;
use crate::flags::{ResultFlags, Shape, shape_rows};
use crate::results::QueryResult;
use crate::script::Script;
use crate::statement::{Statement, StatementState};
use crate::types::{DatabaseType, RowValues};

/// Database-agnostic entry point.
///
/// Owns at most one connection, opened by the first operation that needs it. The
/// one-shot calls (`query`, `exec`) and [`Statement`]s prepared here behave the same on
/// every backend.
///
/// Operational failures never panic or propagate from the plain calls: they return
/// `None`, `0` or `false` and are reported through `tracing` and the diagnostic log.
/// The `try_*` variants return the underlying [`SqlConnectorError`] instead.
///
/// ```rust,no_run
/// use sql_connector::prelude::*;
///
/// # async fn demo() -> Result<(), SqlConnectorError> {
/// let connector = ConnectorConfig::builder(DatabaseType::Sqlite, "bans.db").build()?;
/// connector
///     .exec("CREATE TABLE IF NOT EXISTS banlist (uuid TEXT PRIMARY KEY, deleted INTEGER)", &[])
///     .await;
/// let banned = connector
///     .query("SELECT uuid FROM banlist WHERE deleted = ?", &[RowValues::Int(0)], ResultFlags::MANY_ROWS)
///     .await;
/// assert!(banned.is_some());
/// # Ok(())
/// # }
/// ```
pub struct Connector {
    config: ConnectorConfig,
    connection: OnceCell<Box<dyn DriverConnection>>,
    log: SharedLog,
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Connector {
    /// Create a connector. No connection is opened until the first operation.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError::ConfigError` if the configuration is incomplete.
    pub fn new(config: ConnectorConfig) -> Result<Self, SqlConnectorError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: ConnectorConfig) -> Self {
        if config.has_server_settings() {
            debug!(
                db_type = ?config.db_type,
                "host and credentials are not used by embedded backends"
            );
        }
        Self {
            config,
            connection: OnceCell::new(),
            log: SharedLog::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.config.db_type
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    // ---- diagnostics ----

    /// Enable the diagnostic log, discarding anything recorded before.
    pub fn start_logging(&self) {
        self.log.start();
    }

    pub fn stop_logging(&self) {
        self.log.stop();
    }

    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.log.is_enabled()
    }

    /// Take every entry recorded so far.
    #[must_use]
    pub fn flush_log(&self) -> Vec<LogEntry> {
        self.log.flush()
    }

    // ---- one-shot calls ----

    /// Run `sql` and shape the first rowset per `flags`.
    ///
    /// `None` on failure, and for [`Shape::OneRow`] / [`Shape::Auto`] also when the first
    /// rowset is empty. Use [`Connector::try_query`] to tell the two apart.
    pub async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
        flags: ResultFlags,
    ) -> Option<QueryResult> {
        self.try_query(sql, params, flags).await.ok().flatten()
    }

    /// [`Connector::query`] with the failure handed back.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError` if connecting, compiling, binding, executing or fetching
    /// fails.
    pub async fn try_query(
        &self,
        sql: &str,
        params: &[RowValues],
        flags: ResultFlags,
    ) -> Result<Option<QueryResult>, SqlConnectorError> {
        let mut steps = StepLog::default();
        let result = self.run_query(sql, params, flags, &mut steps).await;
        if let Err(e) = &result {
            warn!(sql, error = %e, "query failed");
        }
        let steps = steps.take();
        self.log.record("query", || {
            let outcome = match &result {
                Ok(Some(shaped)) => json!({ "rows": shaped.len() }),
                Ok(None) => json!({ "rows": 0 }),
                Err(e) => json!({ "error": e.to_string() }),
            };
            payload(
                json!({ "sql": sql, "params": params, "flags": flags }),
                &steps,
                outcome,
            )
        });
        result
    }

    /// Run `sql` and return the rows affected by its first statement. `0` on failure.
    pub async fn exec(&self, sql: &str, params: &[RowValues]) -> usize {
        self.try_exec(sql, params).await.unwrap_or(0)
    }

    /// [`Connector::exec`] with the failure handed back.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError` if connecting, compiling, binding or executing fails.
    pub async fn try_exec(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<usize, SqlConnectorError> {
        let mut steps = StepLog::default();
        let result = self.run_exec(sql, params, &mut steps).await;
        if let Err(e) = &result {
            warn!(sql, error = %e, "exec failed");
        }
        let steps = steps.take();
        self.log.record("exec", || {
            payload(
                json!({ "sql": sql, "params": params }),
                &steps,
                outcome_json(&result),
            )
        });
        result
    }

    /// Compile `sql` into a reusable [`Statement`]. `None` on failure.
    pub async fn prepare(&self, sql: &str, flags: ResultFlags) -> Option<Statement> {
        self.try_prepare(sql, flags).await.ok()
    }

    /// [`Connector::prepare`] with the failure handed back.
    ///
    /// # Errors
    ///
    /// Returns `SqlConnectorError` if connecting fails or the first statement does not
    /// compile.
    pub async fn try_prepare(
        &self,
        sql: &str,
        flags: ResultFlags,
    ) -> Result<Statement, SqlConnectorError> {
        let mut steps = StepLog::default();
        let result = self.compile(sql, &mut steps).await;
        if let Err(e) = &result {
            warn!(sql, error = %e, "prepare failed");
        }
        let steps = steps.take();
        self.log.record("prepare", || {
            let outcome = match &result {
                Ok(_) => json!(true),
                Err(e) => json!({ "error": e.to_string() }),
            };
            payload(json!({ "sql": sql, "flags": flags }), &steps, outcome)
        });
        result.map(|handle| Statement::new(handle, sql, flags, self.log.clone()))
    }

    // ---- connection state ----

    /// Id generated by the most recent insert, `None` if nothing was inserted yet or the
    /// connector has never connected.
    pub async fn last_insert_id(&self) -> Option<i64> {
        let conn = self.connection.get()?;
        let result = conn.last_insert_id().await;
        if let Err(e) = &result {
            warn!(error = %e, "last_insert_id failed");
        }
        let step = Step::from_result("last_insert_id", &result);
        self.log.record("last_insert_id", || {
            payload(JsonValue::Null, &[step], outcome_json(&result))
        });
        result.ok().filter(|id| *id != 0)
    }

    /// Start a transaction, connecting first if needed.
    pub async fn begin_transaction(&self) -> bool {
        let mut steps = StepLog::default();
        let result = match self.connection(&mut steps).await {
            Ok(conn) => steps.track("begin", conn.begin().await),
            Err(e) => Err(e),
        };
        self.finish_transaction_op("begin_transaction", steps, result)
    }

    /// Commit the open transaction. `false` if never connected.
    pub async fn commit(&self) -> bool {
        let Some(conn) = self.connection.get() else {
            return false;
        };
        let mut steps = StepLog::default();
        let result = steps.track("commit", conn.commit().await);
        self.finish_transaction_op("commit", steps, result)
    }

    /// Roll back the open transaction. `false` if never connected.
    pub async fn rollback(&self) -> bool {
        let Some(conn) = self.connection.get() else {
            return false;
        };
        let mut steps = StepLog::default();
        let result = steps.track("rollback", conn.rollback().await);
        self.finish_transaction_op("rollback", steps, result)
    }

    // ---- internals ----

    async fn connection(
        &self,
        steps: &mut StepLog,
    ) -> Result<&dyn DriverConnection, SqlConnectorError> {
        let fresh = !self.connection.initialized();
        let result = self
            .connection
            .get_or_try_init(|| adapter::connect(&self.config))
            .await;
        if fresh {
            steps.push(Step::from_result("connect", &result));
            match &result {
                Ok(_) => debug!(db_type = ?self.config.db_type, "connected"),
                Err(e) => warn!(db_type = ?self.config.db_type, error = %e, "connect failed"),
            }
        }
        result.map(|conn| &**conn)
    }

    async fn compile(
        &self,
        sql: &str,
        steps: &mut StepLog,
    ) -> Result<Box<dyn PreparedHandle>, SqlConnectorError> {
        let conn = self.connection(steps).await?;
        let script = steps.track("parse", Script::parse(sql))?;
        steps.track("prepare", conn.prepare(script).await)
    }

    async fn run_query(
        &self,
        sql: &str,
        params: &[RowValues],
        flags: ResultFlags,
        steps: &mut StepLog,
    ) -> Result<Option<QueryResult>, SqlConnectorError> {
        let handle = self.compile(sql, steps).await?;
        let mut stmt = Statement::one_shot(handle, sql, flags);

        let fetched = match stmt.run(params).await {
            Ok(()) if flags.shape == Shape::OneRow => {
                stmt.next_row_inner().await.map(|row| row.into_iter().collect())
            }
            Ok(()) => stmt.rows_inner().await,
            Err(e) => Err(e),
        };
        release(&mut stmt).await;
        for step in stmt.take_trace() {
            steps.push(step);
        }

        Ok(shape_rows(flags, fetched?))
    }

    async fn run_exec(
        &self,
        sql: &str,
        params: &[RowValues],
        steps: &mut StepLog,
    ) -> Result<usize, SqlConnectorError> {
        let handle = self.compile(sql, steps).await?;
        let mut stmt = Statement::one_shot(handle, sql, ResultFlags::default());

        let counted = match stmt.run(params).await {
            Ok(()) => stmt.row_count_inner().await,
            Err(e) => Err(e),
        };
        release(&mut stmt).await;
        for step in stmt.take_trace() {
            steps.push(step);
        }

        let count = counted?;
        usize::try_from(count).map_err(|e| {
            SqlConnectorError::ExecutionError(format!("affected rows conversion error: {e}"))
        })
    }

    fn finish_transaction_op(
        &self,
        operation: &str,
        mut steps: StepLog,
        result: Result<(), SqlConnectorError>,
    ) -> bool {
        if let Err(e) = &result {
            warn!(operation, error = %e, "transaction control failed");
        }
        let steps = steps.take();
        self.log.record(operation, || {
            payload(JsonValue::Null, &steps, outcome_json(&result))
        });
        result.is_ok()
    }
}

/// Drain the remaining rowsets of a one-shot statement and release it.
async fn release(stmt: &mut Statement) {
    if stmt.state() == StatementState::Ready {
        return;
    }
    if let Err(e) = stmt.reset_inner().await {
        warn!(sql = stmt.sql(), error = %e, "draining remaining rowsets failed");
    }
}

fn outcome_json<T: serde::Serialize>(result: &Result<T, SqlConnectorError>) -> JsonValue {
    match result {
        Ok(value) => json!(value),
        Err(e) => json!({ "error": e.to_string() }),
    }
}
