use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::adapter::PreparedHandle;
use crate::diagnostics::{Step, StepLog};
use crate::error::SqlConnectorError;
use crate::results::ColumnSet;
use crate::script::Script;
use crate::types::{ParamConverter, RowValues};

use super::config::{SharedSqliteConnection, run_blocking};
use super::params::Params;
use super::query::{Rowset, run_buffered};

/// Prepared script on the buffered-native backend.
///
/// Each statement of the script is compiled through rusqlite's statement cache, so a
/// handle reused across executions never recompiles. Executing a statement copies its
/// whole rowset into memory; fetches then read from that buffer.
pub struct SqlitePrepared {
    conn: SharedSqliteConnection,
    script: Script,
    bound: Vec<Params>,
    position: usize,
    columns: ColumnSet,
    rowset: Option<Rowset>,
    steps: StepLog,
}

impl SqlitePrepared {
    pub(crate) fn new(conn: SharedSqliteConnection, script: Script) -> Self {
        Self {
            conn,
            script,
            bound: Vec::new(),
            position: 0,
            columns: ColumnSet::default(),
            rowset: None,
            steps: StepLog::default(),
        }
    }

    fn bind(&mut self, params: &[RowValues]) -> Result<(), SqlConnectorError> {
        let slices = self.script.distribute(params)?;
        let bound = slices
            .into_iter()
            .map(Params::convert_sql_params)
            .collect::<Result<Vec<_>, _>>()?;
        let codes: Vec<String> = bound.iter().map(Params::type_codes).collect();
        self.steps
            .push(Step::ok("bind_param").with_detail(json!(codes)));
        self.bound = bound;
        Ok(())
    }

    async fn run_current(&mut self) -> Result<(), SqlConnectorError> {
        let sql = self
            .script
            .statements()
            .get(self.position)
            .map(|s| s.sql.clone())
            .ok_or_else(|| {
                SqlConnectorError::ExecutionError("no statement left in script".into())
            })?;
        let values = self
            .bound
            .get(self.position)
            .map(|p| p.as_values().to_vec())
            .unwrap_or_default();

        let result = run_blocking(Arc::clone(&self.conn), move |conn| {
            run_buffered(conn, &sql, &values)
        })
        .await;
        let rowset = self.steps.track("execute", result)?;

        if rowset.returns_rows {
            self.steps
                .push(Step::ok("get_result").with_detail(json!({ "rows": rowset.row_count })));
        }
        self.columns = ColumnSet::new(rowset.columns.clone());
        self.rowset = Some(rowset);
        Ok(())
    }

    fn free_result(&mut self) {
        if self.rowset.take().is_some() {
            self.steps.push(Step::ok("free_result"));
        }
        self.columns = ColumnSet::default();
    }
}

#[async_trait]
impl PreparedHandle for SqlitePrepared {
    async fn execute(&mut self, params: &[RowValues]) -> Result<(), SqlConnectorError> {
        self.free_result();
        self.position = 0;
        if let Err(e) = self.bind(params) {
            self.steps.push(Step::failed("bind_param", &e));
            return Err(e);
        }
        self.run_current().await
    }

    fn columns(&self) -> ColumnSet {
        self.columns.clone()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, SqlConnectorError> {
        Ok(self.rowset.as_mut().and_then(|set| set.rows.pop_front()))
    }

    async fn row_count(&mut self) -> Result<u64, SqlConnectorError> {
        Ok(self.rowset.as_ref().map_or(0, |set| set.row_count))
    }

    async fn next_rowset(&mut self) -> Result<bool, SqlConnectorError> {
        self.free_result();
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
        self.free_result();
        self.position = self.script.len();
        Ok(())
    }

    fn take_steps(&mut self) -> Vec<Step> {
        self.steps.take()
    }
}
