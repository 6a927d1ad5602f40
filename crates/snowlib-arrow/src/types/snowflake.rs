//! Snowflake logical types as reported by the SQL API.
//!
//! Every statement response carries `resultSetMetaData.rowType`, one entry
//! per column. [`ColumnMetadata`] deserializes those entries directly and
//! [`SnowflakeType`] classifies the `type` field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ArrowConversionError, Result};

/// Logical column type of a Snowflake result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnowflakeType {
    /// NUMBER / DECIMAL / INT and friends.
    Fixed,
    /// FLOAT / DOUBLE / REAL.
    Real,
    /// VARCHAR / STRING / TEXT.
    Text,
    /// BINARY / VARBINARY.
    Binary,
    /// BOOLEAN.
    Boolean,
    /// DATE.
    Date,
    /// TIME.
    Time,
    /// TIMESTAMP_NTZ.
    TimestampNtz,
    /// TIMESTAMP_LTZ.
    TimestampLtz,
    /// TIMESTAMP_TZ.
    TimestampTz,
    /// VARIANT.
    Variant,
    /// OBJECT.
    Object,
    /// ARRAY.
    Array,
    /// GEOGRAPHY.
    Geography,
    /// GEOMETRY.
    Geometry,
    /// VECTOR.
    Vector,
}

impl SnowflakeType {
    /// Upper-case SQL name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "FIXED",
            Self::Real => "REAL",
            Self::Text => "TEXT",
            Self::Binary => "BINARY",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::TimestampNtz => "TIMESTAMP_NTZ",
            Self::TimestampLtz => "TIMESTAMP_LTZ",
            Self::TimestampTz => "TIMESTAMP_TZ",
            Self::Variant => "VARIANT",
            Self::Object => "OBJECT",
            Self::Array => "ARRAY",
            Self::Geography => "GEOGRAPHY",
            Self::Geometry => "GEOMETRY",
            Self::Vector => "VECTOR",
        }
    }

    /// VARIANT, OBJECT and ARRAY.
    #[must_use]
    pub const fn is_semi_structured(self) -> bool {
        matches!(self, Self::Variant | Self::Object | Self::Array)
    }

    /// DATE, TIME and the three timestamp flavours.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::TimestampNtz | Self::TimestampLtz | Self::TimestampTz
        )
    }
}

impl fmt::Display for SnowflakeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnowflakeType {
    type Err = ArrowConversionError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "number" | "decimal" | "numeric" => Self::Fixed,
            "real" | "float" | "double" => Self::Real,
            "text" | "varchar" | "string" | "char" => Self::Text,
            "binary" | "varbinary" => Self::Binary,
            "boolean" => Self::Boolean,
            "date" => Self::Date,
            "time" => Self::Time,
            "timestamp_ntz" | "timestamp" | "datetime" => Self::TimestampNtz,
            "timestamp_ltz" => Self::TimestampLtz,
            "timestamp_tz" => Self::TimestampTz,
            "variant" => Self::Variant,
            "object" => Self::Object,
            "array" => Self::Array,
            "geography" => Self::Geography,
            "geometry" => Self::Geometry,
            "vector" => Self::Vector,
            _ => return Err(ArrowConversionError::unsupported_type(s)),
        };
        Ok(ty)
    }
}

/// One `rowType` entry of a statement response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    /// Column name as returned by Snowflake (upper-case for unquoted names).
    pub name: String,
    /// Lower-case Snowflake type name (`fixed`, `text`, ...).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Whether the column accepts NULL.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    /// Precision for FIXED columns.
    #[serde(default)]
    pub precision: Option<u8>,
    /// Scale for FIXED and fractional-second precision for temporal columns.
    #[serde(default)]
    pub scale: Option<i8>,
    /// Maximum character length for TEXT columns.
    #[serde(default)]
    pub length: Option<u64>,
    /// Maximum byte length for TEXT and BINARY columns.
    #[serde(default)]
    pub byte_length: Option<u64>,
    /// Source database, empty for computed columns.
    #[serde(default)]
    pub database: String,
    /// Source schema, empty for computed columns.
    #[serde(default)]
    pub schema: String,
    /// Source table, empty for computed columns.
    #[serde(default)]
    pub table: String,
}

const fn default_nullable() -> bool {
    true
}

impl ColumnMetadata {
    /// Create nullable metadata with no precision information.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
            precision: None,
            scale: None,
            length: None,
            byte_length: None,
            database: String::new(),
            schema: String::new(),
            table: String::new(),
        }
    }

    /// Set precision and scale.
    #[must_use]
    pub const fn with_precision_scale(mut self, precision: u8, scale: i8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Set nullability.
    #[must_use]
    pub const fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Classify the column type.
    ///
    /// # Errors
    ///
    /// Returns an error for type names this crate does not know.
    pub fn snowflake_type(&self) -> Result<SnowflakeType> {
        self.type_name.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_names() {
        assert_eq!("fixed".parse::<SnowflakeType>().unwrap(), SnowflakeType::Fixed);
        assert_eq!("TIMESTAMP_TZ".parse::<SnowflakeType>().unwrap(), SnowflakeType::TimestampTz);
        assert_eq!(" variant ".parse::<SnowflakeType>().unwrap(), SnowflakeType::Variant);
        assert!("interval".parse::<SnowflakeType>().unwrap_err().is_unsupported_type());
    }

    #[test]
    fn test_type_classification() {
        assert!(SnowflakeType::Object.is_semi_structured());
        assert!(!SnowflakeType::Text.is_semi_structured());
        assert!(SnowflakeType::TimestampLtz.is_temporal());
        assert_eq!(SnowflakeType::TimestampNtz.to_string(), "TIMESTAMP_NTZ");
    }

    #[test]
    fn test_deserialize_row_type_entry() {
        let json = r#"{
            "name": "AMOUNT",
            "database": "SALES",
            "schema": "PUBLIC",
            "table": "ORDERS",
            "type": "fixed",
            "precision": 12,
            "scale": 2,
            "length": null,
            "byteLength": null,
            "nullable": false,
            "collation": null
        }"#;
        let meta: ColumnMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.name, "AMOUNT");
        assert_eq!(meta.precision, Some(12));
        assert_eq!(meta.scale, Some(2));
        assert!(!meta.nullable);
        assert_eq!(meta.table, "ORDERS");
        assert_eq!(meta.snowflake_type().unwrap(), SnowflakeType::Fixed);
    }

    #[test]
    fn test_deserialize_minimal_entry() {
        let meta: ColumnMetadata =
            serde_json::from_str(r#"{"name": "C", "type": "text", "byteLength": 64}"#).unwrap();
        assert!(meta.nullable);
        assert_eq!(meta.byte_length, Some(64));
        assert!(meta.database.is_empty());
    }
}
