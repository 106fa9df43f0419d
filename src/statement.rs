//! Prepared statement lifecycle.
//!
//! ```text
//!            execute ok                 next_result (none left)
//!   READY ─────────────► RESULT ───────────────────────────► RESULT_END
//!     ▲                    │  next_result (another rowset)       │
//!     │                    └───────────► RESULT                  │
//!     └───────────────────────── reset ──────────────────────────┘
//! ```
//!
//! Calling a method the current state does not allow returns a [`ContractViolation`];
//! database failures never do. They map to sentinels (`false`, `None`, `0`) and show up
//! in the diagnostic log and in `tracing` output.

use async_trait::async_trait;
use serde_json::{Value as JsonValue, json};
use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::task::block_in_place;
use tracing::{debug, warn};

use crate::adapter::PreparedHandle;
use crate::diagnostics::{SharedLog, Step, payload};
use crate::error::{ContractViolation, SqlConnectorError};
use crate::flags::ResultFlags;
use crate::results::{ColumnSet, Row};
use crate::types::RowValues;

/// Where a [`Statement`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementState {
    /// Executable; no result is open.
    Ready,
    /// A rowset is open and can be fetched from.
    Result,
    /// Every rowset has been consumed; only `reset` makes the statement usable again.
    ResultEnd,
}

/// A reusable prepared statement bound to one connection.
///
/// Obtained from `Connector::prepare`. Dropping a statement with an open result runs the
/// rowsets still pending before releasing it, the same as [`Statement::reset`]. On a
/// current-thread runtime that drain happens in a spawned task, so prefer
/// [`Statement::close`] when the script's later statements must have run by the next line.
pub struct Statement {
    handle: Box<dyn PreparedHandle>,
    flags: ResultFlags,
    state: StatementState,
    columns: ColumnSet,
    sql: String,
    log: Option<SharedLog>,
    trace: Vec<Step>,
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("flags", &self.flags)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Statement {
    /// A statement that logs one entry per public operation.
    pub(crate) fn new(
        handle: Box<dyn PreparedHandle>,
        sql: &str,
        flags: ResultFlags,
        log: SharedLog,
    ) -> Self {
        Self::build(handle, sql, flags, Some(log))
    }

    /// A statement driven by a one-shot connector call; its steps are collected with
    /// [`Statement::take_trace`] and logged as part of that call.
    pub(crate) fn one_shot(handle: Box<dyn PreparedHandle>, sql: &str, flags: ResultFlags) -> Self {
        Self::build(handle, sql, flags, None)
    }

    fn build(
        handle: Box<dyn PreparedHandle>,
        sql: &str,
        flags: ResultFlags,
        log: Option<SharedLog>,
    ) -> Self {
        Self {
            handle,
            flags,
            state: StatementState::Ready,
            columns: ColumnSet::default(),
            sql: sql.to_string(),
            log,
            trace: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> StatementState {
        self.state
    }

    #[must_use]
    pub fn flags(&self) -> ResultFlags {
        self.flags
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Column names of the open rowset.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.columns.names()
    }

    /// Bind `params` and run the statement.
    ///
    /// Returns `Ok(false)` when the database rejects the execution; the statement then
    /// stays `Ready` and can be executed again.
    ///
    /// # Errors
    /// Returns [`ContractViolation`] unless the statement is `Ready`.
    pub async fn execute(&mut self, params: &[RowValues]) -> Result<bool, ContractViolation> {
        self.require(StatementState::Ready, "execute")?;
        let result = self.run(params).await;
        let ok = self.report("execute", &result);
        self.finish_op("execute", || json!({ "params": params }), json!(ok));
        Ok(ok)
    }

    /// Next row of the open rowset, or `None` once it is exhausted.
    ///
    /// # Errors
    /// Returns [`ContractViolation`] unless a rowset is open.
    pub async fn row(&mut self) -> Result<Option<Row>, ContractViolation> {
        self.require(StatementState::Result, "row")?;
        let result = self.next_row_inner().await;
        self.report("row", &result);
        let row = result.ok().flatten();
        let outcome = json!(row.is_some());
        self.finish_op("row", || JsonValue::Null, outcome);
        Ok(row)
    }

    /// Every remaining row of the open rowset. `None` only if fetching failed.
    ///
    /// # Errors
    /// Returns [`ContractViolation`] unless a rowset is open.
    pub async fn rows(&mut self) -> Result<Option<Vec<Row>>, ContractViolation> {
        self.require(StatementState::Result, "rows")?;
        let result = self.rows_inner().await;
        self.report("rows", &result);
        let rows = result.ok();
        let outcome = json!(rows.as_ref().map(Vec::len));
        self.finish_op("rows", || JsonValue::Null, outcome);
        Ok(rows)
    }

    /// Rows in the open rowset, or rows affected for statements that return none.
    /// `0` if the count could not be determined.
    ///
    /// # Errors
    /// Returns [`ContractViolation`] unless a rowset is open.
    pub async fn row_count(&mut self) -> Result<u64, ContractViolation> {
        self.require(StatementState::Result, "row_count")?;
        let result = self.row_count_inner().await;
        self.report("row_count", &result);
        let count = result.unwrap_or(0);
        self.finish_op("row_count", || JsonValue::Null, json!(count));
        Ok(count)
    }

    /// Advance to the next rowset. `Ok(false)` once none remain, and from then on.
    ///
    /// # Errors
    /// Returns [`ContractViolation`] while the statement is `Ready`.
    pub async fn next_result(&mut self) -> Result<bool, ContractViolation> {
        if self.state == StatementState::Ready {
            return Err(ContractViolation::new("next_result", self.state));
        }
        if self.state == StatementState::ResultEnd {
            return Ok(false);
        }
        let result = self.advance_inner().await;
        self.report("next_result", &result);
        let advanced = result.unwrap_or(false);
        self.finish_op("next_result", || JsonValue::Null, json!(advanced));
        Ok(advanced)
    }

    /// Return the statement to `Ready`, consuming any rowsets still pending.
    ///
    /// Returns `true` if the statement is `Ready` afterwards. A statement that is already
    /// `Ready` is left alone.
    pub async fn reset(&mut self) -> bool {
        if self.state == StatementState::Ready {
            return true;
        }
        let result = self.reset_inner().await;
        self.report("reset", &result);
        let ready = self.state == StatementState::Ready;
        self.finish_op("reset", || JsonValue::Null, json!(ready));
        ready
    }

    /// Reset the statement, then release it.
    pub async fn close(mut self) -> bool {
        self.reset().await
    }

    pub(crate) fn take_trace(&mut self) -> Vec<Step> {
        self.trace.extend(self.handle.take_steps());
        std::mem::take(&mut self.trace)
    }

    // Operations below enforce transitions but not preconditions; callers check state.

    pub(crate) async fn run(&mut self, params: &[RowValues]) -> Result<(), SqlConnectorError> {
        match self.handle.execute(params).await {
            Ok(()) => {
                self.columns = self.handle.columns();
                self.state = StatementState::Result;
                Ok(())
            }
            Err(e) => {
                // Leave the handle executable again.
                if let Err(close_err) = self.handle.close_cursor() {
                    debug!(error = %close_err, "cursor release after failed execute");
                }
                self.state = StatementState::Ready;
                Err(e)
            }
        }
    }

    pub(crate) async fn next_row_inner(&mut self) -> Result<Option<Row>, SqlConnectorError> {
        let values = self.handle.next_row().await?;
        Ok(values.map(|v| Row::new(self.columns.clone(), v, self.flags.keying)))
    }

    pub(crate) async fn rows_inner(&mut self) -> Result<Vec<Row>, SqlConnectorError> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row_inner().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub(crate) async fn row_count_inner(&mut self) -> Result<u64, SqlConnectorError> {
        self.handle.row_count().await
    }

    pub(crate) async fn advance_inner(&mut self) -> Result<bool, SqlConnectorError> {
        match self.handle.next_rowset().await {
            Ok(true) => {
                self.columns = self.handle.columns();
                Ok(true)
            }
            Ok(false) => {
                self.state = StatementState::ResultEnd;
                self.columns = ColumnSet::default();
                Ok(false)
            }
            Err(e) => {
                self.state = StatementState::ResultEnd;
                self.columns = ColumnSet::default();
                Err(e)
            }
        }
    }

    /// Drain the remaining rowsets, then release the cursor.
    pub(crate) async fn reset_inner(&mut self) -> Result<(), SqlConnectorError> {
        let mut drain_error = None;
        while self.state == StatementState::Result {
            if let Err(e) = self.advance_inner().await {
                drain_error = Some(e);
            }
        }
        self.handle.close_cursor()?;
        self.state = StatementState::Ready;
        match drain_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn require(
        &self,
        expected: StatementState,
        operation: &'static str,
    ) -> Result<(), ContractViolation> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ContractViolation::new(operation, self.state))
        }
    }

    /// Surface a database failure through `tracing`; `true` on success.
    fn report<T>(&self, operation: &str, result: &Result<T, SqlConnectorError>) -> bool {
        match result {
            Ok(_) => true,
            Err(e) => {
                warn!(operation, sql = %self.sql, error = %e, "statement operation failed");
                false
            }
        }
    }

    fn finish_op(&mut self, operation: &str, inputs: impl FnOnce() -> JsonValue, outcome: JsonValue) {
        let steps = self.handle.take_steps();
        match &self.log {
            Some(log) => {
                let state = self.state;
                let sql = &self.sql;
                log.record(operation, || {
                    let mut inputs = inputs();
                    if let JsonValue::Object(map) = &mut inputs {
                        map.insert("sql".to_string(), json!(sql));
                    } else {
                        inputs = json!({ "sql": sql });
                    }
                    let mut entry = payload(inputs, &steps, outcome);
                    if let JsonValue::Object(map) = &mut entry {
                        map.insert("state".to_string(), json!(state));
                    }
                    entry
                });
            }
            None => self.trace.extend(steps),
        }
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        match self.state {
            StatementState::Ready => {}
            StatementState::ResultEnd => {
                if let Err(e) = self.handle.close_cursor() {
                    warn!(sql = %self.sql, error = %e, "statement release failed");
                }
            }
            StatementState::Result => self.drain_on_drop(),
        }
    }
}

impl Statement {
    /// Run the rowsets still pending, then release the cursor, without an `.await`.
    ///
    /// On a multi-thread runtime the drain blocks in place; outside any runtime it runs on
    /// a short-lived one. A current-thread runtime cannot block, so the handle is moved into
    /// a spawned task and drained there.
    fn drain_on_drop(&mut self) {
        debug!(sql = %self.sql, "draining pending rowsets on release");
        match Handle::try_current() {
            Ok(runtime) if runtime.runtime_flavor() == RuntimeFlavor::MultiThread => {
                let result = block_in_place(|| runtime.block_on(drain(&mut *self.handle)));
                warn_on_drain_error(&self.sql, result);
            }
            Ok(runtime) => {
                let mut handle = std::mem::replace(&mut self.handle, Box::new(Released));
                let sql = std::mem::take(&mut self.sql);
                runtime.spawn(async move {
                    let result = drain(&mut *handle).await;
                    warn_on_drain_error(&sql, result);
                });
            }
            Err(_) => {
                let result = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| SqlConnectorError::Other(format!("drain runtime: {e}")))
                    .and_then(|runtime| runtime.block_on(drain(&mut *self.handle)));
                warn_on_drain_error(&self.sql, result);
            }
        }
    }
}

/// Advance through every remaining rowset, then release the cursor.
async fn drain(handle: &mut dyn PreparedHandle) -> Result<(), SqlConnectorError> {
    let mut result = Ok(());
    loop {
        match handle.next_rowset().await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    handle.close_cursor()?;
    result
}

fn warn_on_drain_error(sql: &str, result: Result<(), SqlConnectorError>) {
    if let Err(e) = result {
        warn!(sql, error = %e, "statement release failed");
    }
}

/// Stands in for a handle that was moved out to be drained elsewhere.
struct Released;

#[async_trait]
impl PreparedHandle for Released {
    async fn execute(&mut self, _params: &[RowValues]) -> Result<(), SqlConnectorError> {
        Err(SqlConnectorError::Other("statement already released".to_string()))
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet::default()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlConnectorError> {
        Ok(None)
    }

    async fn row_count(&mut self) -> Result<u64, SqlConnectorError> {
        Ok(0)
    }

    async fn next_rowset(&mut self) -> Result<bool, SqlConnectorError> {
        Ok(false)
    }

    fn close_cursor(&mut self) -> Result<(), SqlConnectorError> {
        Ok(())
    }

    fn take_steps(&mut self) -> Vec<Step> {
        Vec::new()
    }
}
