//! Single-shot conversion from Snowflake rows to Arrow `RecordBatch`.
//!
//! Provides convenience functions for converting a vector of rows
//! into a `RecordBatch` without streaming.

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

use crate::builders::factory::BuilderFactory;
use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::{ArrowConversionError, Result};

/// Convert rows of cell text to an Arrow `RecordBatch`.
///
/// Each row holds one `Option<String>` per schema field; `None` is SQL NULL.
///
/// # Errors
///
/// Returns error if:
/// - A row's width differs from the schema
/// - A cell cannot be converted (the error names the column)
/// - `RecordBatch` creation fails
///
/// # Example
///
/// ```rust,ignore
/// use snowlib_arrow::conversion::rows_to_record_batch;
///
/// let rows = vec![vec![Some("1".to_string()), None]];
/// let batch = rows_to_record_batch(schema, &rows)?;
/// ```
pub fn rows_to_record_batch(schema: SchemaRef, rows: &[Vec<Option<String>>]) -> Result<RecordBatch> {
    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let factory = BuilderFactory::new(rows.len());
    let mut builders = factory.create_builders_for_schema(&schema)?;

    for row in rows {
        append_row_to_builders(&schema, &mut builders, row)?;
    }

    let arrays: Vec<_> = builders.iter_mut().map(|b| b.finish()).collect();
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Append a single row to a vector of builders.
///
/// # Errors
///
/// Returns error if value conversion fails or column count mismatches.
pub(crate) fn append_row_to_builders(
    schema: &SchemaRef,
    builders: &mut [Box<dyn SnowflakeCompatibleBuilder>],
    row: &[Option<String>],
) -> Result<()> {
    if builders.len() != row.len() {
        return Err(ArrowConversionError::schema_mismatch(
            builders.len(),
            row.len(),
        ));
    }

    for ((builder, cell), field) in builders.iter_mut().zip(row).zip(schema.fields()) {
        builder
            .append_option(cell.as_deref())
            .map_err(|e| e.in_column(field.name()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::{Array, Int64Array, StringArray};
    use arrow_schema::{DataType, Field, Schema};

    use super::*;

    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_empty_rows() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));

        let batch = rows_to_record_batch(Arc::clone(&schema), &[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 1);
    }

    #[test]
    fn test_rows_to_batch() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ID", DataType::Int64, false),
            Field::new("NAME", DataType::Utf8, true),
        ]));
        let rows = vec![
            cells(&[Some("1"), Some("alice")]),
            cells(&[Some("2"), None]),
        ];

        let batch = rows_to_record_batch(schema, &rows).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let ids = batch.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(ids.value(1), 2);
        let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(names.value(0), "alice");
        assert!(names.is_null(1));
    }

    #[test]
    fn test_schema_mismatch() {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let rows = vec![cells(&[Some("1"), Some("2")])];

        let err = rows_to_record_batch(schema, &rows).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn test_conversion_error_names_column() {
        let schema = Arc::new(Schema::new(vec![Field::new("AMOUNT", DataType::Int64, true)]));
        let rows = vec![cells(&[Some("abc")])];

        let err = rows_to_record_batch(schema, &rows).unwrap_err();
        assert!(err.is_value_conversion());
        assert!(err.to_string().contains("AMOUNT"));
    }

    #[test]
    fn test_null_in_non_nullable_field_is_arrow_error() {
        let schema = Arc::new(Schema::new(vec![Field::new("ID", DataType::Int64, false)]));
        let rows = vec![cells(&[None])];

        let err = rows_to_record_batch(schema, &rows).unwrap_err();
        assert!(err.is_arrow_error());
    }
}
