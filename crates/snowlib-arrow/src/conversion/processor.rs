//! Batch processor for streaming conversion of result partitions.
//!
//! Snowflake delivers rows in partitions whose size the server picks.
//! The processor re-chunks them into `RecordBatch`es of a fixed size.

use std::sync::Arc;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

use super::batch::append_row_to_builders;
use crate::Result;
use crate::builders::factory::BuilderFactory;
use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::traits::streaming::BatchConfig;

/// Processor that converts Snowflake rows into Arrow `RecordBatch`es.
///
/// Buffers rows until `batch_size` is reached, then emits a `RecordBatch`.
///
/// # Example
///
/// ```rust,ignore
/// use snowlib_arrow::{BatchConfig, SnowflakeBatchProcessor};
///
/// let mut processor = SnowflakeBatchProcessor::new(schema, BatchConfig::default())?;
///
/// for row in partition {
///     if let Some(batch) = processor.process_row(&row)? {
///         // Process batch
///     }
/// }
///
/// if let Some(batch) = processor.flush()? {
///     // Process final batch
/// }
/// ```
pub struct SnowflakeBatchProcessor {
    schema: SchemaRef,
    config: BatchConfig,
    builders: Vec<Box<dyn SnowflakeCompatibleBuilder>>,
    row_count: usize,
}

impl std::fmt::Debug for SnowflakeBatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeBatchProcessor")
            .field("schema", &self.schema)
            .field("config", &self.config)
            .field("builders", &format!("[{} builders]", self.builders.len()))
            .field("row_count", &self.row_count)
            .finish()
    }
}

impl SnowflakeBatchProcessor {
    /// Create a new batch processor.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema field has no valid builder.
    pub fn new(schema: SchemaRef, config: BatchConfig) -> Result<Self> {
        let factory = BuilderFactory::from_config(&config);
        let builders = factory.create_builders_for_schema(&schema)?;

        Ok(Self {
            schema,
            config,
            builders,
            row_count: 0,
        })
    }

    /// Create with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a schema field has no valid builder.
    pub fn with_defaults(schema: SchemaRef) -> Result<Self> {
        Self::new(schema, BatchConfig::default())
    }

    /// Process a single row.
    ///
    /// Returns `Ok(Some(batch))` when a batch is ready, `Ok(None)` when more
    /// rows are needed to fill a batch.
    ///
    /// # Errors
    ///
    /// Returns error if value conversion fails or schema mismatches. A
    /// failed row discards the rows buffered since the last batch.
    pub fn process_row(&mut self, row: &[Option<String>]) -> Result<Option<RecordBatch>> {
        if let Err(e) = append_row_to_builders(&self.schema, &mut self.builders, row) {
            self.discard_buffered();
            return Err(e);
        }
        self.row_count += 1;

        if self.row_count >= self.config.batch_size {
            return Ok(Some(self.finish_current_batch()?));
        }

        Ok(None)
    }

    /// Flush any remaining rows as a final batch.
    ///
    /// # Errors
    ///
    /// Returns error if `RecordBatch` creation fails.
    pub fn flush(&mut self) -> Result<Option<RecordBatch>> {
        if self.row_count == 0 {
            return Ok(None);
        }

        Ok(Some(self.finish_current_batch()?))
    }

    /// Returns the schema of batches produced by this processor.
    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    /// Returns the current row count in the buffer.
    #[must_use]
    pub const fn buffered_rows(&self) -> usize {
        self.row_count
    }

    fn finish_current_batch(&mut self) -> Result<RecordBatch> {
        let arrays: Vec<_> = self.builders.iter_mut().map(|b| b.finish()).collect();
        self.row_count = 0;

        Ok(RecordBatch::try_new(Arc::clone(&self.schema), arrays)?)
    }

    fn discard_buffered(&mut self) {
        for builder in &mut self.builders {
            builder.reset();
        }
        self.row_count = 0;
    }
}
