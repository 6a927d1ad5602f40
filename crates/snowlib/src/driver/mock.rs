//! Scripted in-memory driver for unit tests

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use snowlib_arrow::ColumnMetadata;

use super::{
    BindValue, Cell, Driver, PartitionInfo, ResultSetMetaData, Statement, StatementResponse, StatementState,
    StatementStats,
};
use crate::error::CANCELLED_ERROR_CODE;
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum Reply {
    Response {
        response: StatementResponse,
        extra_partitions: Vec<Vec<Vec<Cell>>>,
    },
    Error {
        code: String,
        sql_state: String,
        message: String,
    },
    Block(Vec<StatementResponse>),
}

#[derive(Debug, Clone)]
enum Outcome {
    Done(StatementResponse),
    Failed {
        code: String,
        sql_state: String,
        message: String,
    },
}

#[derive(Debug)]
struct Pending {
    remaining_running: usize,
    outcome: Outcome,
    extra_partitions: Vec<Vec<Vec<Cell>>>,
}

#[derive(Debug, Default)]
struct State {
    rules: Vec<(String, Reply)>,
    handles: HashMap<String, Pending>,
    next_id: usize,
    running_polls: usize,
    status_calls: usize,
    executed: Vec<Statement>,
    cancelled: Vec<String>,
    closed: bool,
    no_file_transfer: bool,
}

impl State {
    fn next_handle(&mut self) -> String {
        self.next_id += 1;
        format!("01b2c3d4-0000-0000-0000-{:012}", self.next_id)
    }

    fn register(&mut self, outcome: Outcome, extra_partitions: Vec<Vec<Vec<Cell>>>) -> String {
        let handle = self.next_handle();
        let outcome = match outcome {
            Outcome::Done(mut response) => {
                response.statement_handle = Some(handle.clone());
                Outcome::Done(response)
            }
            failed @ Outcome::Failed { .. } => failed,
        };
        self.handles.insert(
            handle.clone(),
            Pending {
                remaining_running: self.running_polls,
                outcome,
                extra_partitions,
            },
        );
        handle
    }

    /// Earlier result named by a `RESULT_SCAN(?)` binding
    fn scanned(&self, statement: &Statement) -> Option<(StatementResponse, Vec<Vec<Vec<Cell>>>)> {
        if !statement.sql.contains("RESULT_SCAN(") {
            return None;
        }
        let Some(BindValue::Text(query_id)) = statement.bindings.first() else {
            return None;
        };
        match self.handles.get(query_id) {
            Some(Pending {
                outcome: Outcome::Done(response),
                extra_partitions,
                ..
            }) => Some((response.clone(), extra_partitions.clone())),
            _ => None,
        }
    }
}

/// Driver answering statements from substring rules.
///
/// The first rule whose pattern occurs in the SQL wins. An unmatched
/// `RESULT_SCAN` replays the result of the bound query id; any other
/// unmatched statement succeeds with an empty result.
#[derive(Debug, Default)]
pub(crate) struct MockDriver {
    state: Mutex<State>,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn rule(self, pattern: &str, reply: Reply) -> Self {
        self.state.lock().rules.push((pattern.to_string(), reply));
        self
    }

    /// Report no `PUT`/`GET` support, like the HTTP driver
    pub(crate) fn without_file_transfer(self) -> Self {
        self.state.lock().no_file_transfer = true;
        self
    }

    pub(crate) fn on_query(self, pattern: &str, response: StatementResponse) -> Self {
        self.rule(
            pattern,
            Reply::Response {
                response,
                extra_partitions: Vec::new(),
            },
        )
    }

    /// Result split over several partitions; `response` holds partition 0
    pub(crate) fn on_partitioned(
        self,
        pattern: &str,
        mut response: StatementResponse,
        extra_partitions: Vec<Vec<Vec<Cell>>>,
    ) -> Self {
        if let Some(meta) = response.result_set_meta_data.as_mut() {
            let first = response.data.as_ref().map_or(0, Vec::len);
            meta.partition_info = std::iter::once(first)
                .chain(extra_partitions.iter().map(Vec::len))
                .map(|rows| PartitionInfo {
                    row_count: rows as u64,
                    ..PartitionInfo::default()
                })
                .collect();
            meta.num_rows = Some(meta.partition_info.iter().map(|p| p.row_count as i64).sum());
        }
        self.rule(
            pattern,
            Reply::Response {
                response,
                extra_partitions,
            },
        )
    }

    pub(crate) fn on_error(self, pattern: &str, code: &str, sql_state: &str, message: &str) -> Self {
        self.rule(
            pattern,
            Reply::Error {
                code: code.to_string(),
                sql_state: sql_state.to_string(),
                message: message.to_string(),
            },
        )
    }

    /// Multi-statement block answering with one child result per response
    pub(crate) fn on_block(self, pattern: &str, children: Vec<StatementResponse>) -> Self {
        self.rule(pattern, Reply::Block(children))
    }

    /// Result with the given `(name, type)` columns and text rows
    pub(crate) fn rows(columns: &[(&str, &str)], rows: &[&[Option<&str>]]) -> StatementResponse {
        let row_type = columns
            .iter()
            .map(|(name, type_name)| {
                let column = ColumnMetadata::new(*name, *type_name);
                if type_name.eq_ignore_ascii_case("fixed") {
                    column.with_precision_scale(18, 0)
                } else {
                    column
                }
            })
            .collect();
        let data: Vec<Vec<Cell>> = rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.map(str::to_string)).collect())
            .collect();

        StatementResponse {
            result_set_meta_data: Some(ResultSetMetaData {
                num_rows: Some(data.len() as i64),
                format: Some("jsonv2".to_string()),
                row_type,
                partition_info: vec![PartitionInfo {
                    row_count: data.len() as u64,
                    ..PartitionInfo::default()
                }],
            }),
            data: Some(data),
            ..StatementResponse::default()
        }
    }

    /// Single text column result, the shape of scalar functions
    pub(crate) fn scalar(column: &str, value: Option<&str>) -> StatementResponse {
        Self::rows(&[(column, "text")], &[&[value]])
    }

    /// DML result with an insert count
    pub(crate) fn dml(inserted: i64) -> StatementResponse {
        StatementResponse {
            stats: Some(StatementStats {
                num_rows_inserted: inserted,
                ..StatementStats::default()
            }),
            ..Self::rows(&[("number of rows inserted", "fixed")], &[])
        }
    }

    pub(crate) fn set_running_polls(&self, polls: usize) {
        self.state.lock().running_polls = polls;
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.state.lock().status_calls
    }

    pub(crate) fn executed(&self) -> Vec<Statement> {
        self.state.lock().executed.clone()
    }

    pub(crate) fn executed_sql(&self) -> Vec<String> {
        self.state
            .lock()
            .executed
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.state.lock().cancelled.clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn submit(&self, statement: &Statement) -> Result<String> {
        let mut state = self.state.lock();
        state.executed.push(statement.clone());

        let reply = state
            .rules
            .iter()
            .find(|(pattern, _)| statement.sql.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone());

        let handle = match reply {
            None => match state.scanned(statement) {
                Some((response, extra_partitions)) => {
                    state.register(Outcome::Done(response), extra_partitions)
                }
                None => state.register(Outcome::Done(Self::rows(&[], &[])), Vec::new()),
            },
            Some(Reply::Response {
                response,
                extra_partitions,
            }) => state.register(Outcome::Done(response), extra_partitions),
            Some(Reply::Error {
                code,
                sql_state,
                message,
            }) => state.register(
                Outcome::Failed {
                    code,
                    sql_state,
                    message,
                },
                Vec::new(),
            ),
            Some(Reply::Block(children)) => {
                let handles = children
                    .into_iter()
                    .map(|child| state.register(Outcome::Done(child), Vec::new()))
                    .collect();
                let parent = StatementResponse {
                    statement_handles: Some(handles),
                    ..Self::rows(&[("multiple statement execution", "text")], &[])
                };
                state.register(Outcome::Done(parent), Vec::new())
            }
        };
        Ok(handle)
    }

    async fn status(&self, handle: &str) -> Result<StatementState> {
        let mut state = self.state.lock();
        state.status_calls += 1;

        let pending = state.handles.get_mut(handle).ok_or_else(|| Error::Snowflake {
            code: "000709".to_string(),
            sql_state: "02000".to_string(),
            message: format!("Statement {handle} not found"),
            query_id: Some(handle.to_string()),
        })?;

        if pending.remaining_running > 0 {
            pending.remaining_running -= 1;
            return Ok(StatementState::Running);
        }

        match &pending.outcome {
            Outcome::Done(response) => Ok(StatementState::Complete(Box::new(response.clone()))),
            Outcome::Failed {
                code,
                sql_state,
                message,
            } => Err(Error::Snowflake {
                code: code.clone(),
                sql_state: sql_state.clone(),
                message: message.clone(),
                query_id: Some(handle.to_string()),
            }),
        }
    }

    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<Vec<Vec<Cell>>> {
        let state = self.state.lock();
        let pending = state
            .handles
            .get(handle)
            .ok_or_else(|| Error::invalid_argument(format!("Unknown handle {handle}")))?;

        match (&pending.outcome, partition) {
            (Outcome::Done(response), 0) => Ok(response.data.clone().unwrap_or_default()),
            (_, n) => n
                .checked_sub(1)
                .and_then(|i| pending.extra_partitions.get(i))
                .cloned()
                .ok_or_else(|| Error::invalid_argument(format!("No partition {n} for {handle}"))),
        }
    }

    async fn cancel(&self, handle: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.cancelled.push(handle.to_string());
        if let Some(pending) = state.handles.get_mut(handle) {
            pending.remaining_running = 0;
            pending.outcome = Outcome::Failed {
                code: CANCELLED_ERROR_CODE.to_string(),
                sql_state: "57014".to_string(),
                message: "SQL execution canceled".to_string(),
            };
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().closed = true;
        Ok(())
    }

    fn supports_file_transfer(&self) -> bool {
        !self.state.lock().no_file_transfer
    }
}
