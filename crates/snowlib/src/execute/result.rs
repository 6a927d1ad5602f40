//! Uniform result wrapper for executed statements

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use arrow_array::RecordBatch;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use snowlib_arrow::{
    BatchConfig, ColumnMetadata, SchemaMapper, SnowflakeBatchProcessor, rows_to_record_batch,
};

use crate::Result;
use crate::driver::{Cell, Driver, StatementResponse};

/// One result row with case-insensitive column lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Cell>,
}

impl Row {
    pub(crate) const fn new(columns: Arc<[String]>, values: Vec<Cell>) -> Self {
        Self { columns, values }
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `name`, ignoring case
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Text of column `name`; `None` for NULL or unknown columns
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.index_of(name).and_then(|i| self.get_index(i))
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }
}

/// Result of a completed statement.
///
/// Rows after the first partition are fetched on demand.
pub struct QueryResult {
    query_id: String,
    sql: String,
    rowcount: i64,
    columns: Vec<ColumnMetadata>,
    first_partition: Vec<Vec<Cell>>,
    partitions: usize,
    driver: Arc<dyn Driver>,
}

impl QueryResult {
    pub(crate) fn new(
        sql: impl Into<String>,
        response: StatementResponse,
        driver: Arc<dyn Driver>,
    ) -> Self {
        let rowcount = response.rowcount();
        let partitions = response.partition_count();
        let columns = response.row_type().to_vec();
        Self {
            query_id: response.statement_handle.unwrap_or_default(),
            sql: sql.into(),
            rowcount,
            columns,
            first_partition: response.data.unwrap_or_default(),
            partitions,
            driver,
        }
    }

    #[must_use]
    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Rows affected or returned, `-1` when unknown
    #[must_use]
    pub const fn rowcount(&self) -> i64 {
        self.rowcount
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Column metadata of the result set
    #[must_use]
    pub fn description(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    async fn partition(&self, index: usize) -> Result<Vec<Vec<Cell>>> {
        if index == 0 {
            return Ok(self.first_partition.clone());
        }
        self.driver.fetch_partition(&self.query_id, index).await
    }

    async fn all_cells(&self) -> Result<Vec<Vec<Cell>>> {
        let mut rows = self.first_partition.clone();
        for index in 1..self.partitions {
            rows.extend(self.partition(index).await?);
        }
        Ok(rows)
    }

    fn row_header(&self) -> Arc<[String]> {
        self.column_names().into()
    }

    /// First row, if any
    pub async fn fetch_one(&self) -> Result<Option<Row>> {
        let header = self.row_header();
        if let Some(first) = self.first_partition.first() {
            return Ok(Some(Row::new(header, first.clone())));
        }
        // An empty first partition can precede non-empty ones
        for index in 1..self.partitions {
            if let Some(first) = self.partition(index).await?.into_iter().next() {
                return Ok(Some(Row::new(header, first)));
            }
        }
        Ok(None)
    }

    /// Every row across all partitions
    pub async fn fetch_all(&self) -> Result<Vec<Row>> {
        let header = self.row_header();
        Ok(self
            .all_cells()
            .await?
            .into_iter()
            .map(|values| Row::new(Arc::clone(&header), values))
            .collect())
    }

    /// Whole result as one batch; `lowercase` lower-cases column names
    pub async fn to_batch(&self, lowercase: bool) -> Result<RecordBatch> {
        let schema = SchemaMapper::schema_ref_from_row_type(&self.columns, lowercase)?;
        let rows = self.all_cells().await?;
        Ok(rows_to_record_batch(schema, &rows)?)
    }

    /// Stream of batches of at most `config.batch_size` rows
    pub fn into_batches(
        self,
        config: BatchConfig,
        lowercase: bool,
    ) -> Result<BoxStream<'static, Result<RecordBatch>>> {
        let schema = SchemaMapper::schema_ref_from_row_type(&self.columns, lowercase)?;
        let state = BatchState {
            processor: SnowflakeBatchProcessor::new(schema, config)?,
            result: self,
            next_partition: 0,
            ready: VecDeque::new(),
            finished: false,
        };
        Ok(stream::try_unfold(state, next_batch).boxed())
    }
}

struct BatchState {
    result: QueryResult,
    processor: SnowflakeBatchProcessor,
    next_partition: usize,
    ready: VecDeque<RecordBatch>,
    finished: bool,
}

async fn next_batch(mut state: BatchState) -> Result<Option<(RecordBatch, BatchState)>> {
    loop {
        if let Some(batch) = state.ready.pop_front() {
            return Ok(Some((batch, state)));
        }
        if state.finished {
            return Ok(None);
        }

        if state.next_partition < state.result.partitions {
            let rows = state.result.partition(state.next_partition).await?;
            state.next_partition += 1;
            for row in &rows {
                if let Some(batch) = state.processor.process_row(row)? {
                    state.ready.push_back(batch);
                }
            }
        } else {
            state.finished = true;
            if let Some(batch) = state.processor.flush()? {
                state.ready.push_back(batch);
            }
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QueryResult(query_id='{}', rowcount={})",
            self.query_id, self.rowcount
        )
    }
}

impl fmt::Debug for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("query_id", &self.query_id)
            .field("rowcount", &self.rowcount)
            .field("columns", &self.column_names())
            .field("partitions", &self.partitions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use arrow_array::{Array, Int64Array, StringArray};
    use futures::TryStreamExt;

    use super::*;
    use crate::driver::Statement;
    use crate::driver::mock::MockDriver;

    async fn run(mock: MockDriver, sql: &str) -> QueryResult {
        let driver: Arc<dyn Driver> = Arc::new(mock);
        let response = driver.execute(&Statement::new(sql)).await.unwrap();
        QueryResult::new(sql, response, driver)
    }

    fn people() -> StatementResponse {
        MockDriver::rows(
            &[("ID", "fixed"), ("NAME", "text")],
            &[&[Some("1"), Some("ada")], &[Some("2"), None]],
        )
    }

    #[test]
    fn test_row_lookup_ignores_case() {
        let row = Row::new(
            vec!["ID".to_string(), "name".to_string()].into(),
            vec![Some("1".into()), None],
        );
        assert_eq!(row.get("id"), Some("1"));
        assert_eq!(row.get("NAME"), None);
        assert!(row.contains("Name"));
        assert!(!row.contains("missing"));
        assert_eq!(row.index_of("name"), Some(1));
        assert_eq!(row.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_rows() {
        let result = run(MockDriver::new().on_query("FROM people", people()), "SELECT * FROM people").await;

        assert_eq!(result.rowcount(), 2);
        assert_eq!(result.column_names(), vec!["ID", "NAME"]);
        assert!(result.query_id().starts_with("01b2c3d4"));

        let first = result.fetch_one().await.unwrap().unwrap();
        assert_eq!(first.get("name"), Some("ada"));

        let all = result.fetch_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].get("NAME"), None);
    }

    #[tokio::test]
    async fn test_display() {
        let result = run(MockDriver::new().on_query("FROM people", people()), "SELECT * FROM people").await;
        assert_eq!(
            result.to_string(),
            format!("QueryResult(query_id='{}', rowcount=2)", result.query_id())
        );
    }

    #[tokio::test]
    async fn test_to_batch_lowercases_by_request() {
        let result = run(MockDriver::new().on_query("FROM people", people()), "SELECT * FROM people").await;

        let batch = result.to_batch(true).await.unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).name(), "id");

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(1), 2);
        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert!(names.is_null(1));

        let upper = result.to_batch(false).await.unwrap();
        assert_eq!(upper.schema().field(1).name(), "NAME");
    }

    #[tokio::test]
    async fn test_partitions_are_fetched() {
        let mock = MockDriver::new().on_partitioned(
            "FROM big",
            MockDriver::rows(&[("N", "fixed")], &[&[Some("1")], &[Some("2")]]),
            vec![
                vec![vec![Some("3".to_string())]],
                vec![vec![Some("4".to_string())], vec![Some("5".to_string())]],
            ],
        );
        let result = run(mock, "SELECT N FROM big").await;

        assert_eq!(result.rowcount(), 5);
        assert_eq!(result.fetch_all().await.unwrap().len(), 5);

        let batches: Vec<RecordBatch> = result
            .into_batches(BatchConfig::with_batch_size(2), true)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let sizes: Vec<usize> = batches.iter().map(RecordBatch::num_rows).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let result = run(MockDriver::new(), "CREATE TABLE T (A INT)").await;
        assert!(result.fetch_one().await.unwrap().is_none());
        assert_eq!(result.to_batch(true).await.unwrap().num_rows(), 0);

        let batches: Vec<RecordBatch> = result
            .into_batches(BatchConfig::default(), true)
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert!(batches.is_empty());
    }
}
