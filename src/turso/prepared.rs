use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::json;

use crate::adapter::PreparedHandle;
use crate::diagnostics::{Step, StepLog};
use crate::error::SqlConnectorError;
use crate::results::ColumnSet;
use crate::script::Script;
use crate::types::{ParamConverter, RowValues};

use super::params::Params;
use super::query::{changes_since, column_names, fetch_row, total_changes};

/// Where the current statement's results stand.
enum Cursor {
    Closed,
    /// A statement without result columns ran and changed this many rows.
    Affected(u64),
    /// A live library cursor. `lookahead` holds rows already pulled from it to count them.
    Open {
        rows: turso::Rows,
        lookahead: VecDeque<Vec<RowValues>>,
        fetched: u64,
        drained: bool,
    },
}

/// Prepared script on the library-managed backend.
///
/// Rows stay in the library's cursor until fetched. Compiled statements are cached per
/// script position and reset, not recompiled, between executions.
pub struct TursoPrepared {
    conn: turso::Connection,
    script: Script,
    compiled: Vec<Option<turso::Statement>>,
    bound: Vec<Params>,
    position: usize,
    columns: ColumnSet,
    cursor: Cursor,
    steps: StepLog,
}

impl TursoPrepared {
    pub(crate) async fn prepare(
        conn: turso::Connection,
        script: Script,
    ) -> Result<Self, SqlConnectorError> {
        let first = conn.prepare(&script.statements()[0].sql).await?;

        let mut compiled: Vec<Option<turso::Statement>> =
            (0..script.len()).map(|_| None).collect();
        compiled[0] = Some(first);

        Ok(Self {
            conn,
            script,
            compiled,
            bound: Vec::new(),
            position: 0,
            columns: ColumnSet::default(),
            cursor: Cursor::Closed,
            steps: StepLog::default(),
        })
    }

    async fn run_current(&mut self) -> Result<(), SqlConnectorError> {
        let idx = self.position;
        if self.compiled[idx].is_none() {
            let stmt = self.conn.prepare(&self.script.statements()[idx].sql).await;
            let stmt = self.steps.track("prepare", stmt)?;
            self.compiled[idx] = Some(stmt);
        }
        let names = match self.compiled[idx].as_ref() {
            Some(stmt) => column_names(stmt),
            None => Vec::new(),
        };
        let before = if names.is_empty() {
            total_changes(&self.conn).await?
        } else {
            0
        };
        let params = self
            .bound
            .get(idx)
            .map(Params::to_positional)
            .unwrap_or_else(|| turso::params::Params::Positional(Vec::new()));
        let Some(stmt) = self.compiled[idx].as_mut() else {
            return Err(SqlConnectorError::ExecutionError(
                "Turso statement missing after prepare".to_string(),
            ));
        };

        if names.is_empty() {
            let ran = stmt.execute(params).await;
            self.steps.track("execute", ran)?;
            let affected = changes_since(&self.conn, before).await?;
            self.steps
                .push(Step::ok("changes").with_detail(json!({ "rows": affected })));
            self.cursor = Cursor::Affected(affected);
        } else {
            let rows = stmt.query(params).await;
            let rows = self.steps.track("execute", rows)?;
            self.cursor = Cursor::Open {
                rows,
                lookahead: VecDeque::new(),
                fetched: 0,
                drained: false,
            };
        }
        self.columns = ColumnSet::new(names);
        Ok(())
    }

    /// Drop the cursor and reset the current statement so it can run again.
    fn close_current(&mut self) {
        if matches!(self.cursor, Cursor::Closed) {
            return;
        }
        self.cursor = Cursor::Closed;
        self.columns = ColumnSet::default();
        if let Some(stmt) = self.compiled.get(self.position).and_then(Option::as_ref) {
            stmt.reset();
        }
        self.steps.push(Step::ok("close_cursor"));
    }
}

#[async_trait]
impl PreparedHandle for TursoPrepared {
    async fn execute(&mut self, params: &[RowValues]) -> Result<(), SqlConnectorError> {
        self.close_current();
        self.position = 0;
        let slices = match self.script.distribute(params) {
            Ok(slices) => slices,
            Err(e) => {
                self.steps.push(Step::failed("bind_param", &e));
                return Err(e);
            }
        };
        self.bound = slices
            .into_iter()
            .map(Params::convert_sql_params)
            .collect::<Result<Vec<_>, _>>()?;
        self.steps.push(
            Step::ok("bind_param").with_detail(json!({ "count": params.len() })),
        );
        self.run_current().await
    }

    fn columns(&self) -> ColumnSet {
        self.columns.clone()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlConnectorError> {
        let Cursor::Open {
            rows,
            lookahead,
            fetched,
            drained,
        } = &mut self.cursor
        else {
            return Ok(None);
        };
        if let Some(row) = lookahead.pop_front() {
            *fetched += 1;
            return Ok(Some(row));
        }
        if *drained {
            return Ok(None);
        }
        let row = self.steps.track("fetch", fetch_row(rows).await)?;
        match row {
            Some(values) => {
                *fetched += 1;
                Ok(Some(values))
            }
            None => {
                *drained = true;
                Ok(None)
            }
        }
    }

    async fn row_count(&mut self) -> Result<u64, SqlConnectorError> {
        match &mut self.cursor {
            Cursor::Closed => Ok(0),
            Cursor::Affected(n) => Ok(*n),
            Cursor::Open {
                rows,
                lookahead,
                fetched,
                drained,
            } => {
                // The library cannot count a streaming cursor, so pull the rest forward.
                while !*drained {
                    match fetch_row(rows).await? {
                        Some(values) => lookahead.push_back(values),
                        None => *drained = true,
                    }
                }
                Ok(*fetched + lookahead.len() as u64)
            }
        }
    }

    async fn next_rowset(&mut self) -> Result<bool, SqlConnectorError> {
        self.close_current();
        if self.position + 1 >= self.script.len() {
            self.position = self.script.len();
            return Ok(false);
        }
        self.position += 1;
        self.steps.push(Step::ok("next_result"));
        self.run_current().await?;
        Ok(true)
    }

    fn close_cursor(&mut self) -> Result<(), SqlConnectorError> {
        self.close_current();
        self.position = self.script.len();
        Ok(())
    }

    fn take_steps(&mut self) -> Vec<Step> {
        self.steps.take()
    }
}

impl Drop for TursoPrepared {
    fn drop(&mut self) {
        self.close_current();
    }
}
