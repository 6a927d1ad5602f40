//! Row to `RecordBatch` conversion.
//!
//! - [`batch`] - one-shot conversion of an in-memory row set
//! - [`processor`] - buffered conversion for streamed partitions

pub mod batch;
pub mod processor;

pub use batch::rows_to_record_batch;
pub use processor::SnowflakeBatchProcessor;
