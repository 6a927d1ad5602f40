//! Statement execution and result handling
//!
//! [`Executor`] runs statements against a [`Context`]; the free functions
//! are one-shot shorthands for it. Every path yields a [`QueryResult`] or an
//! [`AsyncQuery`] handle.

mod async_query;
mod result;

use arrow_array::RecordBatch;
use futures::stream::BoxStream;
use snowlib_arrow::BatchConfig;

pub use async_query::AsyncQuery;
pub use result::{QueryResult, Row};

use crate::constants::RESULT_SCAN_QUERY;
use crate::context::Context;
use crate::driver::{BindValue, Statement};
use crate::sql::{Fqn, SafeQuery};
use crate::{Error, Result};

/// Runs statements with positional `?` bindings
#[derive(Debug, Clone)]
pub struct Executor {
    context: Context,
}

impl Executor {
    #[must_use]
    pub const fn new(context: Context) -> Self {
        Self { context }
    }

    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    pub async fn run(&self, sql: &str, bindings: &[BindValue]) -> Result<QueryResult> {
        self.run_statement(Statement::new(sql).with_bindings(bindings.to_vec()))
            .await
    }

    pub async fn run_query(&self, query: &SafeQuery) -> Result<QueryResult> {
        self.run_statement(query.to_statement()).await
    }

    async fn run_statement(&self, statement: Statement) -> Result<QueryResult> {
        let driver = self.context.driver().await?;
        tracing::debug!(sql = %statement.sql, bindings = statement.bindings.len(), "Executing statement");
        let response = driver.execute(&statement).await?;
        Ok(QueryResult::new(statement.sql, response, driver))
    }

    /// Submit without waiting
    pub async fn run_async(&self, sql: &str, bindings: &[BindValue]) -> Result<AsyncQuery> {
        let driver = self.context.driver().await?;
        let statement = Statement::new(sql).with_bindings(bindings.to_vec());
        let handle = driver.submit(&statement).await?;
        if handle.is_empty() {
            return Err(Error::invalid_argument(
                "Failed to get queryId from async execution response",
            ));
        }
        tracing::debug!(query_id = %handle, "Submitted asynchronous statement");
        Ok(AsyncQuery::new(handle, sql, self.context.clone()))
    }

    /// Run `;`-separated statements, one result per statement
    pub async fn run_block(&self, sql: &str) -> Result<Vec<QueryResult>> {
        let driver = self.context.driver().await?;
        let response = driver
            .execute(&Statement::new(sql).multi_statement())
            .await?;

        let Some(handles) = response.statement_handles.clone() else {
            return Ok(vec![QueryResult::new(sql, response, driver)]);
        };

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let child = driver.wait(&handle).await?;
            results.push(QueryResult::new(sql, child, driver.clone()));
        }
        Ok(results)
    }

    /// Run, then read the rows back through `RESULT_SCAN`
    pub async fn run_with_result_scan(
        &self,
        sql: &str,
        bindings: &[BindValue],
    ) -> Result<QueryResult> {
        let first = self.run(sql, bindings).await?;
        self.run(RESULT_SCAN_QUERY, &[BindValue::from(first.query_id())])
            .await
    }
}

pub async fn execute_sql(sql: &str, context: &Context) -> Result<QueryResult> {
    Executor::new(context.clone()).run(sql, &[]).await
}

pub async fn execute_sql_async(sql: &str, context: &Context) -> Result<AsyncQuery> {
    Executor::new(context.clone()).run_async(sql, &[]).await
}

pub async fn execute_block(sql: &str, context: &Context) -> Result<Vec<QueryResult>> {
    Executor::new(context.clone()).run_block(sql).await
}

/// Run `sql` and collect the result into one batch with lower-case columns
pub async fn query(sql: &str, context: &Context) -> Result<RecordBatch> {
    execute_sql(sql, context).await?.to_batch(true).await
}

pub async fn fetch_one(sql: &str, context: &Context) -> Result<Option<Row>> {
    execute_sql(sql, context).await?.fetch_one().await
}

pub async fn fetch_all(sql: &str, context: &Context) -> Result<Vec<Row>> {
    execute_sql(sql, context).await?.fetch_all().await
}

/// Run `sql` and stream the result in batches of `config.batch_size` rows
pub async fn fetch_batches(
    sql: &str,
    context: &Context,
    config: BatchConfig,
    lowercase: bool,
) -> Result<BoxStream<'static, Result<RecordBatch>>> {
    execute_sql(sql, context)
        .await?
        .into_batches(config, lowercase)
}

/// Column names of `database.schema.table`
pub async fn get_columns(
    context: &Context,
    table: &str,
    schema: &str,
    database: &str,
    uppercase: bool,
) -> Result<Vec<String>> {
    let fqn = Fqn::from_parts([database, schema, table])?;
    let result = Executor::new(context.clone())
        .run_with_result_scan(&format!("SHOW COLUMNS IN TABLE {fqn}"), &[])
        .await?;

    Ok(result
        .fetch_all()
        .await?
        .iter()
        .filter_map(|row| row.get("column_name"))
        .map(|name| {
            if uppercase {
                name.to_uppercase()
            } else {
                name.to_lowercase()
            }
        })
        .collect())
}

/// Table names in `database.schema`
pub async fn list_tables(context: &Context, schema: &str, database: &str) -> Result<Vec<String>> {
    let fqn = Fqn::from_parts([database, schema])?;
    let result = Executor::new(context.clone())
        .run_with_result_scan(&format!("SHOW TABLES IN {fqn}"), &[])
        .await?;

    Ok(result
        .fetch_all()
        .await?
        .iter()
        .filter_map(|row| row.get("name").map(str::to_string))
        .collect())
}

/// Case-insensitive membership in [`list_tables`]
pub async fn table_exists(
    context: &Context,
    table: &str,
    schema: &str,
    database: &str,
) -> Result<bool> {
    Ok(list_tables(context, schema, database)
        .await?
        .iter()
        .any(|name| name.eq_ignore_ascii_case(table)))
}
