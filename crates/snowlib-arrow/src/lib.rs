//! Apache Arrow conversion for Snowflake SQL API result sets.
//!
//! The SQL API v2 returns every cell as JSON text. This crate turns those
//! cells into typed Arrow `RecordBatch`es, and renders Arrow values back
//! into the text Snowflake accepts in bindings.
//!
//! # Features
//!
//! - Snowflake `rowType` to Arrow schema mapping
//! - Buffered `RecordBatch` construction for partitioned results
//! - Sealed builder traits for API stability
//! - JSON rendering of nested Arrow values for VARIANT columns
//!
//! # Example
//!
//! ```rust,ignore
//! use snowlib_arrow::{BatchConfig, SchemaMapper, SnowflakeBatchProcessor};
//!
//! let schema = SchemaMapper::schema_ref_from_row_type(&row_type, true)?;
//! let mut processor = SnowflakeBatchProcessor::new(schema, BatchConfig::default())?;
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builders;
pub mod conversion;
pub mod encode;
pub mod error;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use builders::BuilderFactory;
pub use conversion::{SnowflakeBatchProcessor, rows_to_record_batch};
pub use encode::{cell_text, is_json_eligible, json_value, lenient_cell_text};
pub use error::{ArrowConversionError, Result};
pub use schema::SchemaMapper;
pub use traits::{BatchConfig, FromSnowflakeCell, SnowflakeCompatibleBuilder};
pub use types::arrow::{
    FieldMetadataExt, SNOWFLAKE_TYPE_KEY, snowflake_field_to_arrow, snowflake_type_to_arrow,
};
pub use types::conversion::{is_nested, snowflake_type_for};
pub use types::snowflake::{ColumnMetadata, SnowflakeType};
