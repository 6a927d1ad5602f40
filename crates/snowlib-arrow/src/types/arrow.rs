//! Arrow type mappings from Snowflake types.
//!
//! This module provides the authoritative mapping between Snowflake result
//! types and Apache Arrow types.
//!
//! # Type Mapping Table
//!
//! | Snowflake Type | Arrow Type | Notes |
//! |----------------|------------|-------|
//! | FIXED(p<=18, 0) | Int64 | |
//! | FIXED(p>18, 0) | Decimal128(p,0) | |
//! | FIXED(p, s>0) | Decimal128(p,s) | Full precision |
//! | REAL | Float64 | |
//! | TEXT | Utf8 | |
//! | BINARY | Binary | Hex on the wire |
//! | BOOLEAN | Boolean | |
//! | DATE | Date32 | Days since epoch |
//! | TIME | Time64(Nanosecond) | |
//! | TIMESTAMP_NTZ | Timestamp(Nanosecond, None) | |
//! | TIMESTAMP_LTZ/TZ | Timestamp(Nanosecond, "UTC") | Offset folded into the instant |
//! | VARIANT/OBJECT/ARRAY | Utf8 | JSON text |
//! | GEOGRAPHY/GEOMETRY/VECTOR | Utf8 | Text rendering |

use std::collections::HashMap;

use arrow_schema::{DataType, Field, TimeUnit};

use super::snowflake::{ColumnMetadata, SnowflakeType};
use crate::{ArrowConversionError, Result};

/// Field metadata key holding the upper-case Snowflake type name.
pub const SNOWFLAKE_TYPE_KEY: &str = "snowflake.type";

/// Largest precision an `Int64` column can hold without loss.
const MAX_INT64_PRECISION: u8 = 18;

/// Largest precision supported by Snowflake and `Decimal128`.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Convert a Snowflake type to an Arrow `DataType`.
///
/// # Arguments
///
/// * `ty` - The Snowflake logical type
/// * `precision` - Precision for FIXED columns (defaults to 38)
/// * `scale` - Scale for FIXED columns (defaults to 0)
///
/// # Errors
///
/// Returns an error when FIXED precision is outside `1..=38` or the scale
/// is negative or larger than the precision.
#[allow(clippy::match_same_arms)]
pub fn snowflake_type_to_arrow(
    ty: SnowflakeType,
    precision: Option<u8>,
    scale: Option<i8>,
) -> Result<DataType> {
    let data_type = match ty {
        SnowflakeType::Fixed => {
            let p = precision.unwrap_or(MAX_DECIMAL_PRECISION);
            let s = scale.unwrap_or(0);
            if p == 0 || p > MAX_DECIMAL_PRECISION {
                return Err(ArrowConversionError::invalid_precision(format!(
                    "precision {p} outside 1..={MAX_DECIMAL_PRECISION}"
                )));
            }
            if s < 0 || s.unsigned_abs() > p {
                return Err(ArrowConversionError::invalid_scale(format!(
                    "scale {s} outside 0..={p}"
                )));
            }
            if s == 0 && p <= MAX_INT64_PRECISION {
                DataType::Int64
            } else {
                DataType::Decimal128(p, s)
            }
        }
        SnowflakeType::Real => DataType::Float64,
        SnowflakeType::Text => DataType::Utf8,
        SnowflakeType::Binary => DataType::Binary,
        SnowflakeType::Boolean => DataType::Boolean,
        SnowflakeType::Date => DataType::Date32,
        SnowflakeType::Time => DataType::Time64(TimeUnit::Nanosecond),
        SnowflakeType::TimestampNtz => DataType::Timestamp(TimeUnit::Nanosecond, None),
        SnowflakeType::TimestampLtz | SnowflakeType::TimestampTz => {
            DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into()))
        }
        SnowflakeType::Variant | SnowflakeType::Object | SnowflakeType::Array => DataType::Utf8,
        SnowflakeType::Geography | SnowflakeType::Geometry | SnowflakeType::Vector => {
            DataType::Utf8
        }
    };
    Ok(data_type)
}

/// Create an Arrow Field from Snowflake column metadata.
///
/// The field carries [`SNOWFLAKE_TYPE_KEY`] metadata so JSON columns stay
/// distinguishable from plain text after conversion.
///
/// # Errors
///
/// Returns an error for unknown types or invalid precision/scale.
pub fn snowflake_field_to_arrow(name: &str, column: &ColumnMetadata) -> Result<Field> {
    let ty = column.snowflake_type()?;
    let data_type = snowflake_type_to_arrow(ty, column.precision, column.scale)?;
    let metadata = HashMap::from([(SNOWFLAKE_TYPE_KEY.to_string(), ty.as_str().to_string())]);
    Ok(Field::new(name, data_type, column.nullable).with_metadata(metadata))
}

/// Extension trait for [`ColumnMetadata`].
///
/// Provides convenient conversion methods for result metadata to Arrow types.
pub trait FieldMetadataExt {
    /// Convert to Arrow Field using the column's own name.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types or invalid precision/scale.
    fn to_arrow_field(&self) -> Result<Field>;

    /// Get the Arrow `DataType` for this column.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown types or invalid precision/scale.
    fn arrow_data_type(&self) -> Result<DataType>;
}

impl FieldMetadataExt for ColumnMetadata {
    fn to_arrow_field(&self) -> Result<Field> {
        snowflake_field_to_arrow(&self.name, self)
    }

    fn arrow_data_type(&self) -> Result<DataType> {
        snowflake_type_to_arrow(self.snowflake_type()?, self.precision, self.scale)
    }
}

/// Get the category name for a Snowflake type.
#[must_use]
pub const fn type_category(ty: SnowflakeType) -> &'static str {
    match ty {
        SnowflakeType::Fixed | SnowflakeType::Real => "Numeric",
        SnowflakeType::Text => "String",
        SnowflakeType::Binary => "Binary",
        SnowflakeType::Boolean => "Boolean",
        SnowflakeType::Date
        | SnowflakeType::Time
        | SnowflakeType::TimestampNtz
        | SnowflakeType::TimestampLtz
        | SnowflakeType::TimestampTz => "Temporal",
        SnowflakeType::Variant | SnowflakeType::Object | SnowflakeType::Array => "SemiStructured",
        SnowflakeType::Geography | SnowflakeType::Geometry => "Spatial",
        SnowflakeType::Vector => "Vector",
    }
}
