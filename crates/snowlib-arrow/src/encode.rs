//! Arrow values rendered as Snowflake bind text.
//!
//! The inverse direction of the builders: each Arrow cell becomes the
//! `Option<String>` the SQL API accepts in a binding, or the JSON document
//! stored in a VARIANT column.

use arrow::util::display::{ArrayFormatter, FormatOptions};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float16Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type,
    UInt16Type, UInt32Type, UInt64Type,
};
use arrow_array::{Array, ArrayRef};
use arrow_schema::DataType;
use serde_json::{Map, Number, Value};

use crate::types::conversion::is_nested;
use crate::{ArrowConversionError, Result};

/// Whether a column should be stored as VARIANT via `PARSE_JSON`.
///
/// True only for nested arrays that hold at least one non-null value and
/// no NaN or infinite float anywhere inside, since neither is valid JSON.
#[must_use]
pub fn is_json_eligible(array: &dyn Array) -> bool {
    is_nested(array.data_type())
        && array.null_count() < array.len()
        && !contains_non_finite(array)
}

fn contains_non_finite(array: &dyn Array) -> bool {
    match array.data_type() {
        DataType::Float16 => array
            .as_primitive::<Float16Type>()
            .iter()
            .flatten()
            .any(|v| !v.to_f64().is_finite()),
        DataType::Float32 => array
            .as_primitive::<Float32Type>()
            .iter()
            .flatten()
            .any(|v| !v.is_finite()),
        DataType::Float64 => array
            .as_primitive::<Float64Type>()
            .iter()
            .flatten()
            .any(|v| !v.is_finite()),
        DataType::List(_) => contains_non_finite(array.as_list::<i32>().values()),
        DataType::LargeList(_) => contains_non_finite(array.as_list::<i64>().values()),
        DataType::FixedSizeList(_, _) => contains_non_finite(array.as_fixed_size_list().values()),
        DataType::Struct(_) => array
            .as_struct()
            .columns()
            .iter()
            .any(|c| contains_non_finite(c)),
        DataType::Map(_, _) => {
            let map = array.as_map();
            contains_non_finite(map.keys()) || contains_non_finite(map.values())
        }
        _ => false,
    }
}

/// Bind text for one cell, `None` for SQL NULL.
///
/// Nested values render as compact JSON, binary as hex, timestamps as
/// ISO-8601 and everything else through Arrow's display formatting.
///
/// # Errors
///
/// Returns an error when a nested value cannot be expressed as JSON.
pub fn cell_text(array: &ArrayRef, row: usize) -> Result<Option<String>> {
    render_cell(array, row, NonFinite::Reject)
}

/// Like [`cell_text`], but NaN and infinite floats inside nested values
/// render as the strings `"NaN"`, `"inf"` and `"-inf"`.
///
/// For nested columns that are loaded as plain text rather than VARIANT.
///
/// # Errors
///
/// Returns an error when a map key is null or a value has no display form.
pub fn lenient_cell_text(array: &ArrayRef, row: usize) -> Result<Option<String>> {
    render_cell(array, row, NonFinite::AsString)
}

fn render_cell(array: &ArrayRef, row: usize, non_finite: NonFinite) -> Result<Option<String>> {
    if array.is_null(row) {
        return Ok(None);
    }

    let text = match array.data_type() {
        dt if is_nested(dt) => {
            serde_json::to_string(&to_json(array.as_ref(), row, non_finite)?)?
        }
        DataType::Boolean => array.as_boolean().value(row).to_string(),
        DataType::Binary => hex::encode(array.as_binary::<i32>().value(row)),
        DataType::LargeBinary => hex::encode(array.as_binary::<i64>().value(row)),
        DataType::FixedSizeBinary(_) => hex::encode(array.as_fixed_size_binary().value(row)),
        DataType::Utf8 => array.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => array.as_string::<i64>().value(row).to_string(),
        DataType::Utf8View => array.as_string_view().value(row).to_string(),
        _ => display_value(array.as_ref(), row)?,
    };
    Ok(Some(text))
}

/// What to do with a float JSON has no number for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NonFinite {
    Reject,
    AsString,
}

/// JSON representation of one cell.
///
/// Nulls at any depth become JSON `null`.
///
/// # Errors
///
/// Returns an error for non-finite floats or map keys that cannot be
/// rendered as strings.
pub fn json_value(array: &dyn Array, row: usize) -> Result<Value> {
    to_json(array, row, NonFinite::Reject)
}

fn to_json(array: &dyn Array, row: usize, non_finite: NonFinite) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }

    let value = match array.data_type() {
        DataType::Boolean => Value::Bool(array.as_boolean().value(row)),
        DataType::Int8 => Value::from(array.as_primitive::<Int8Type>().value(row)),
        DataType::Int16 => Value::from(array.as_primitive::<Int16Type>().value(row)),
        DataType::Int32 => Value::from(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => Value::from(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::from(array.as_primitive::<UInt8Type>().value(row)),
        DataType::UInt16 => Value::from(array.as_primitive::<UInt16Type>().value(row)),
        DataType::UInt32 => Value::from(array.as_primitive::<UInt32Type>().value(row)),
        DataType::UInt64 => Value::from(array.as_primitive::<UInt64Type>().value(row)),
        DataType::Float16 => float_value(
            array.as_primitive::<Float16Type>().value(row).to_f64(),
            non_finite,
        )?,
        DataType::Float32 => float_value(
            f64::from(array.as_primitive::<Float32Type>().value(row)),
            non_finite,
        )?,
        DataType::Float64 => {
            float_value(array.as_primitive::<Float64Type>().value(row), non_finite)?
        }
        DataType::Utf8 => Value::from(array.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Value::from(array.as_string::<i64>().value(row)),
        DataType::Utf8View => Value::from(array.as_string_view().value(row)),
        DataType::Binary => Value::from(hex::encode(array.as_binary::<i32>().value(row))),
        DataType::LargeBinary => Value::from(hex::encode(array.as_binary::<i64>().value(row))),
        DataType::List(_) => {
            list_value(array.as_list::<i32>().value(row).as_ref(), non_finite)?
        }
        DataType::LargeList(_) => {
            list_value(array.as_list::<i64>().value(row).as_ref(), non_finite)?
        }
        DataType::FixedSizeList(_, _) => {
            list_value(array.as_fixed_size_list().value(row).as_ref(), non_finite)?
        }
        DataType::Struct(fields) => {
            let structs = array.as_struct();
            let mut object = Map::with_capacity(fields.len());
            for (field, column) in fields.iter().zip(structs.columns()) {
                object.insert(
                    field.name().clone(),
                    to_json(column.as_ref(), row, non_finite)?,
                );
            }
            Value::Object(object)
        }
        DataType::Map(_, _) => {
            let entries = array.as_map().value(row);
            let keys = entries.column(0);
            let values = entries.column(1);
            let mut object = Map::with_capacity(entries.len());
            for i in 0..entries.len() {
                let key = match to_json(keys.as_ref(), i, non_finite)? {
                    Value::String(s) => s,
                    Value::Null => {
                        return Err(ArrowConversionError::json("map key must not be null"));
                    }
                    other => other.to_string(),
                };
                object.insert(key, to_json(values.as_ref(), i, non_finite)?);
            }
            Value::Object(object)
        }
        _ => Value::String(display_value(array, row)?),
    };
    Ok(value)
}

fn list_value(values: &dyn Array, non_finite: NonFinite) -> Result<Value> {
    (0..values.len())
        .map(|i| to_json(values, i, non_finite))
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn float_value(value: f64, non_finite: NonFinite) -> Result<Value> {
    match (Number::from_f64(value), non_finite) {
        (Some(number), _) => Ok(Value::Number(number)),
        (None, NonFinite::AsString) => Ok(Value::String(value.to_string())),
        (None, NonFinite::Reject) => Err(ArrowConversionError::json(format!(
            "{value} is not valid JSON"
        ))),
    }
}

fn display_value(array: &dyn Array, row: usize) -> Result<String> {
    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(array, &options)?;
    Ok(formatter.value(row).to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow_array::builder::{
        Float64Builder, Int64Builder, ListBuilder, MapBuilder, StringBuilder,
    };
    use arrow_array::{
        BinaryArray, Float64Array, Int64Array, ListArray, StringArray, StructArray,
        TimestampNanosecondArray,
    };
    use arrow_schema::Field;

    use super::*;

    fn int_list(rows: &[Option<Vec<Option<i64>>>]) -> ListArray {
        let mut builder = ListBuilder::new(Int64Builder::new());
        for row in rows {
            match row {
                Some(values) => {
                    for v in values {
                        builder.values().append_option(*v);
                    }
                    builder.append(true);
                }
                None => builder.append(false),
            }
        }
        builder.finish()
    }

    #[test]
    fn test_scalar_columns_are_not_eligible() {
        let ints = Int64Array::from(vec![1, 2]);
        assert!(!is_json_eligible(&ints));
    }

    #[test]
    fn test_list_column_is_eligible() {
        let list = int_list(&[Some(vec![Some(1), None]), None]);
        assert!(is_json_eligible(&list));
    }

    #[test]
    fn test_all_null_nested_column_is_not_eligible() {
        let list = int_list(&[None, None]);
        assert!(!is_json_eligible(&list));
    }

    #[test]
    fn test_nan_inside_struct_is_not_eligible() {
        let floats: ArrayRef = Arc::new(Float64Array::from(vec![1.0, f64::NAN]));
        let structs = StructArray::from(vec![(
            Arc::new(Field::new("x", DataType::Float64, true)),
            floats,
        )]);
        assert!(!is_json_eligible(&structs));
    }

    #[test]
    fn test_list_renders_json_with_nested_nulls() {
        let list: ArrayRef = Arc::new(int_list(&[Some(vec![Some(1), None, Some(3)]), None]));
        assert_eq!(cell_text(&list, 0).unwrap().as_deref(), Some("[1,null,3]"));
        assert_eq!(cell_text(&list, 1).unwrap(), None);
    }

    #[test]
    fn test_struct_renders_object() {
        let names: ArrayRef = Arc::new(StringArray::from(vec!["a"]));
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![7]));
        let structs: ArrayRef = Arc::new(StructArray::from(vec![
            (Arc::new(Field::new("name", DataType::Utf8, true)), names),
            (Arc::new(Field::new("id", DataType::Int64, true)), ids),
        ]));
        let text = cell_text(&structs, 0).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::json!({"name": "a", "id": 7}));
    }

    #[test]
    fn test_map_renders_object() {
        let mut builder = MapBuilder::new(None, StringBuilder::new(), Int64Builder::new());
        builder.keys().append_value("k");
        builder.values().append_value(1);
        builder.append(true).unwrap();
        let map: ArrayRef = Arc::new(builder.finish());
        assert_eq!(cell_text(&map, 0).unwrap().as_deref(), Some("{\"k\":1}"));
    }

    #[test]
    fn test_non_finite_json_is_error() {
        let floats = Float64Array::from(vec![f64::INFINITY]);
        assert!(json_value(&floats, 0).unwrap_err().is_json());
    }

    #[test]
    fn test_lenient_text_keeps_non_finite_floats() {
        let mut builder = ListBuilder::new(Float64Builder::new());
        builder.values().append_slice(&[1.5, f64::NAN, f64::NEG_INFINITY]);
        builder.append(true);
        let list: ArrayRef = Arc::new(builder.finish());

        assert!(cell_text(&list, 0).unwrap_err().is_json());
        assert_eq!(
            lenient_cell_text(&list, 0).unwrap().as_deref(),
            Some(r#"[1.5,"NaN","-inf"]"#)
        );
    }

    #[test]
    fn test_lenient_text_matches_strict_for_scalars() {
        let floats: ArrayRef = Arc::new(Float64Array::from(vec![Some(f64::INFINITY), None]));
        assert_eq!(lenient_cell_text(&floats, 0).unwrap(), cell_text(&floats, 0).unwrap());
        assert_eq!(lenient_cell_text(&floats, 1).unwrap(), None);
    }

    #[test]
    fn test_binary_renders_hex() {
        let binary: ArrayRef = Arc::new(BinaryArray::from(vec![&b"Hi"[..]]));
        assert_eq!(cell_text(&binary, 0).unwrap().as_deref(), Some("4869"));
    }

    #[test]
    fn test_timestamp_renders_iso() {
        let ts: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![0_i64]));
        let text = cell_text(&ts, 0).unwrap().unwrap();
        assert!(text.starts_with("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_scalars_render_plain_text() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(42), None]));
        assert_eq!(cell_text(&ints, 0).unwrap().as_deref(), Some("42"));
        assert_eq!(cell_text(&ints, 1).unwrap(), None);

        let strings: ArrayRef = Arc::new(StringArray::from(vec!["it's"]));
        assert_eq!(cell_text(&strings, 0).unwrap().as_deref(), Some("it's"));
    }
}
