//! Snowflake to Arrow schema mapping.
//!
//! Converts SQL API `resultSetMetaData.rowType` entries to an Arrow Schema.

use std::sync::Arc;

use arrow_schema::{Field, Schema, SchemaRef};

use crate::Result;
use crate::types::arrow::snowflake_field_to_arrow;
use crate::types::snowflake::ColumnMetadata;

/// Schema mapper for converting Snowflake result metadata to Arrow schema.
///
/// # Example
///
/// ```rust,ignore
/// use snowlib_arrow::SchemaMapper;
///
/// let schema = SchemaMapper::from_row_type(&row_type, true)?;
/// let fields = schema.fields();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaMapper;

impl SchemaMapper {
    /// Create a new schema mapper.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build an Arrow schema from Snowflake column metadata.
    ///
    /// With `lowercase` set, field names are lower-cased; the
    /// `snowflake.type` metadata is kept either way.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown column type or invalid
    /// precision/scale.
    pub fn from_row_type(row_type: &[ColumnMetadata], lowercase: bool) -> Result<Schema> {
        let fields = row_type
            .iter()
            .map(|column| {
                if lowercase {
                    snowflake_field_to_arrow(&column.name.to_lowercase(), column)
                } else {
                    snowflake_field_to_arrow(&column.name, column)
                }
            })
            .collect::<Result<Vec<Field>>>()?;

        Ok(Schema::new(fields))
    }

    /// Build an Arrow `SchemaRef` from Snowflake column metadata.
    ///
    /// # Errors
    ///
    /// See [`SchemaMapper::from_row_type`].
    pub fn schema_ref_from_row_type(
        row_type: &[ColumnMetadata],
        lowercase: bool,
    ) -> Result<SchemaRef> {
        Self::from_row_type(row_type, lowercase).map(Arc::new)
    }
}
