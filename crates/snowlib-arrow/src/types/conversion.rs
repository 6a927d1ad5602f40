//! Reverse mapping from Arrow types to Snowflake column types.
//!
//! Used when a table is created from a `RecordBatch`. The mapping is coarse
//! on purpose: Snowflake widens every integer to `NUMBER(38,0)` anyway.

use arrow_schema::DataType;

/// Snowflake DDL type for an Arrow data type.
///
/// Nested types are not handled here; callers decide whether a nested
/// column becomes `VARIANT` after inspecting its values.
#[must_use]
pub fn snowflake_type_for(data_type: &DataType) -> String {
    let name = match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => "INT",
        DataType::Float16 | DataType::Float32 | DataType::Float64 => "FLOAT",
        DataType::Boolean => "BOOLEAN",
        DataType::Timestamp(_, Some(_)) => "TIMESTAMP_TZ",
        DataType::Timestamp(_, None) => "TIMESTAMP_NTZ",
        DataType::Date32 | DataType::Date64 => "DATE",
        DataType::Time32(_) | DataType::Time64(_) | DataType::Duration(_) => "TIME",
        DataType::Decimal128(precision, scale) | DataType::Decimal256(precision, scale) => {
            return format!("NUMBER({},{})", (*precision).min(38), scale);
        }
        DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => "BINARY",
        _ => "VARCHAR",
    };
    name.to_string()
}

/// Check if an Arrow type is nested (struct, list or map).
#[must_use]
pub const fn is_nested(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Struct(_)
            | DataType::List(_)
            | DataType::LargeList(_)
            | DataType::FixedSizeList(_, _)
            | DataType::Map(_, _)
    )
}

/// Check if an Arrow type is an integer or float.
#[must_use]
pub const fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}
