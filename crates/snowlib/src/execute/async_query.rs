use std::fmt;

use super::{Executor, QueryResult};
use crate::Result;
use crate::constants::CANCEL_QUERY;
use crate::context::Context;
use crate::driver::{BindValue, QueryStatus, query_status};

/// Handle to a statement submitted without waiting for completion
#[derive(Debug, Clone)]
pub struct AsyncQuery {
    query_id: String,
    sql: String,
    context: Context,
}

impl AsyncQuery {
    pub(crate) fn new(query_id: String, sql: impl Into<String>, context: Context) -> Self {
        Self {
            query_id,
            sql: sql.into(),
            context,
        }
    }

    #[must_use]
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub async fn status(&self) -> Result<QueryStatus> {
        let driver = self.context.driver().await?;
        query_status(driver.as_ref(), &self.query_id).await
    }

    pub async fn is_running(&self) -> Result<bool> {
        Ok(self.status().await?.is_running())
    }

    pub async fn is_done(&self) -> Result<bool> {
        Ok(!self.status().await?.is_running())
    }

    /// Wait for completion and return the result
    pub async fn get_result(&self) -> Result<QueryResult> {
        let driver = self.context.driver().await?;
        let response = driver.wait(&self.query_id).await?;
        Ok(QueryResult::new(self.sql.clone(), response, driver))
    }

    /// Cancel through `SYSTEM$CANCEL_QUERY`.
    ///
    /// Returns whether Snowflake reported the query cancelled or terminated.
    pub async fn abort(&self) -> Result<bool> {
        let result = Executor::new(self.context.clone())
            .run(CANCEL_QUERY, &[BindValue::from(self.query_id.as_str())])
            .await?;
        let reply = result
            .fetch_one()
            .await?
            .and_then(|row| row.get_index(0).map(str::to_lowercase))
            .unwrap_or_default();

        let aborted = reply.contains("cancelled") || reply.contains("terminated");
        tracing::debug!(query_id = %self.query_id, %reply, aborted, "Abort requested");
        Ok(aborted)
    }

    /// Cancel through the statements endpoint
    pub async fn cancel(&self) -> Result<()> {
        let driver = self.context.driver().await?;
        driver.cancel(&self.query_id).await
    }
}

impl fmt::Display for AsyncQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AsyncQuery(query_id='{}')", self.query_id)
    }
}
