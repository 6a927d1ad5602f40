//! Statement transport
//!
//! [`Driver`] is the seam between snowlib and Snowflake. [`HttpDriver`]
//! speaks the SQL API v2; tests script responses with an in-memory driver.

mod http;
#[cfg(test)]
pub(crate) mod mock;
mod types;

use std::fmt;

use async_trait::async_trait;

pub use http::HttpDriver;
pub use types::{
    BindValue, Cell, PartitionInfo, QueryStatus, ResultSetMetaData, Statement, StatementResponse,
    StatementState, StatementStats,
};
pub(crate) use types::{PartitionResponse, StatementRequest, encode_bindings};

use crate::constants::{POLL_INITIAL_DELAY, POLL_MAX_DELAY};
use crate::{Error, Result};

#[async_trait]
pub trait Driver: Send + Sync + fmt::Debug {
    /// Run a statement and wait for it to finish
    async fn execute(&self, statement: &Statement) -> Result<StatementResponse> {
        let handle = self.submit(statement).await?;
        self.wait(&handle).await
    }

    /// Start a statement without waiting; returns its handle
    async fn submit(&self, statement: &Statement) -> Result<String>;

    /// Poll a statement once. Failed statements return their error.
    async fn status(&self, handle: &str) -> Result<StatementState>;

    /// Poll with doubling backoff until the statement completes
    async fn wait(&self, handle: &str) -> Result<StatementResponse> {
        let mut delay = POLL_INITIAL_DELAY;
        loop {
            match self.status(handle).await? {
                StatementState::Complete(response) => return Ok(*response),
                StatementState::Running => {
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(POLL_MAX_DELAY);
                }
            }
        }
    }

    /// Rows of result partition `partition`
    async fn fetch_partition(&self, handle: &str, partition: usize) -> Result<Vec<Vec<Cell>>>;

    /// Ask the server to cancel a running statement
    async fn cancel(&self, handle: &str) -> Result<()>;

    /// Release server-side session state
    async fn close(&self) -> Result<()>;

    /// Whether `PUT`/`GET` statements can run through this driver
    fn supports_file_transfer(&self) -> bool {
        true
    }
}

/// Map an error body from the API into [`Error::Snowflake`]
pub(crate) fn statement_error(response: &StatementResponse, fallback: &str) -> Error {
    Error::Snowflake {
        code: response.code.clone().unwrap_or_default(),
        sql_state: response.sql_state.clone().unwrap_or_default(),
        message: response
            .message
            .clone()
            .unwrap_or_else(|| fallback.to_string()),
        query_id: response.statement_handle.clone(),
    }
}

/// Status of a statement as an asynchronous query sees it
pub async fn query_status(driver: &dyn Driver, handle: &str) -> Result<QueryStatus> {
    match driver.status(handle).await {
        Ok(StatementState::Running) => Ok(QueryStatus::Running),
        Ok(StatementState::Complete(_)) => Ok(QueryStatus::Success),
        Err(e) if e.is_cancelled() => Ok(QueryStatus::Aborted),
        Err(e) if e.is_snowflake() => Ok(QueryStatus::FailedWithError),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockDriver;
    use super::*;

    #[tokio::test]
    async fn test_execute_polls_until_complete() {
        let driver = MockDriver::new().on_query("SELECT 1", MockDriver::rows(&[("X", "fixed")], &[&[Some("1")]]));
        driver.set_running_polls(3);

        let response = driver.execute(&Statement::new("SELECT 1")).await.unwrap();

        assert_eq!(response.data.unwrap(), vec![vec![Some("1".to_string())]]);
        assert_eq!(driver.status_calls(), 4);
    }

    #[tokio::test]
    async fn test_query_status_mapping() {
        let driver = MockDriver::new()
            .on_error("bad", "002003", "42S02", "Object does not exist")
            .on_error("slow", crate::error::CANCELLED_ERROR_CODE, "57014", "cancelled");

        let ok = driver.submit(&Statement::new("SELECT 1")).await.unwrap();
        let bad = driver.submit(&Statement::new("SELECT bad")).await.unwrap();
        let aborted = driver.submit(&Statement::new("SELECT slow")).await.unwrap();

        assert_eq!(query_status(&driver, &ok).await.unwrap(), QueryStatus::Success);
        assert_eq!(
            query_status(&driver, &bad).await.unwrap(),
            QueryStatus::FailedWithError
        );
        assert_eq!(
            query_status(&driver, &aborted).await.unwrap(),
            QueryStatus::Aborted
        );
    }

    #[test]
    fn test_statement_error_mapping() {
        let response = StatementResponse {
            code: Some("002003".into()),
            sql_state: Some("42S02".into()),
            message: Some("Table 'T' does not exist".into()),
            statement_handle: Some("h1".into()),
            ..StatementResponse::default()
        };
        let err = statement_error(&response, "unused");
        assert_eq!(err.snowflake_code(), Some("002003"));
        assert!(err.to_string().contains("Table 'T' does not exist"));
    }
}
