//! Sealed trait pattern for API evolution without breaking changes.
//!
//! External code can USE these traits but CANNOT implement them.
//!
//! # Pattern
//!
//! ```rust,ignore
//! mod private {
//!     pub trait Sealed {}
//! }
//!
//! pub trait MyPublicTrait: private::Sealed {
//!     fn method(&self);
//! }
//! ```

use arrow_schema::DataType;

/// Private module that external crates cannot access.
pub(crate) mod private {
    /// Marker trait that seals the public traits.
    pub trait Sealed {}
}

/// Types that can be parsed from a Snowflake result cell.
///
/// The SQL API v2 ships every value as text, so each implementation owns
/// the textual format of one Arrow primitive.
pub trait FromSnowflakeCell: private::Sealed {
    /// The Arrow data type this converter produces.
    fn arrow_type() -> DataType;

    /// Parse one non-null cell.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid value of this type.
    fn from_cell(cell: &str) -> crate::Result<Self>
    where
        Self: Sized;
}

// ═══════════════════════════════════════════════════════════════════════════
// Sealed Implementations for Primitive Types
// ═══════════════════════════════════════════════════════════════════════════

impl private::Sealed for i64 {}
impl FromSnowflakeCell for i64 {
    fn arrow_type() -> DataType {
        DataType::Int64
    }

    fn from_cell(cell: &str) -> crate::Result<Self> {
        cell.trim().parse().map_err(|_| {
            crate::ArrowConversionError::value_conversion("i64", format!("invalid integer '{cell}'"))
        })
    }
}

impl private::Sealed for f64 {}
impl FromSnowflakeCell for f64 {
    fn arrow_type() -> DataType {
        DataType::Float64
    }

    // Snowflake renders special values as "NaN", "inf" and "-inf", all of
    // which `str::parse` accepts.
    fn from_cell(cell: &str) -> crate::Result<Self> {
        cell.trim().parse().map_err(|_| {
            crate::ArrowConversionError::value_conversion("f64", format!("invalid float '{cell}'"))
        })
    }
}

impl private::Sealed for bool {}
impl FromSnowflakeCell for bool {
    fn arrow_type() -> DataType {
        DataType::Boolean
    }

    fn from_cell(cell: &str) -> crate::Result<Self> {
        match cell.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(crate::ArrowConversionError::value_conversion(
                "bool",
                format!("invalid boolean '{cell}'"),
            )),
        }
    }
}

impl private::Sealed for String {}
impl FromSnowflakeCell for String {
    fn arrow_type() -> DataType {
        DataType::Utf8
    }

    fn from_cell(cell: &str) -> crate::Result<Self> {
        Ok(cell.to_owned())
    }
}

impl private::Sealed for Vec<u8> {}
impl FromSnowflakeCell for Vec<u8> {
    fn arrow_type() -> DataType {
        DataType::Binary
    }

    fn from_cell(cell: &str) -> crate::Result<Self> {
        hex::decode(cell.trim()).map_err(|e| {
            crate::ArrowConversionError::value_conversion("Vec<u8>", format!("invalid hex: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_types() {
        assert_eq!(i64::arrow_type(), DataType::Int64);
        assert_eq!(String::arrow_type(), DataType::Utf8);
        assert_eq!(f64::arrow_type(), DataType::Float64);
        assert_eq!(<Vec<u8>>::arrow_type(), DataType::Binary);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(i64::from_cell("-42").unwrap(), -42);
        assert!(i64::from_cell("4.2").unwrap_err().is_value_conversion());
    }

    #[test]
    fn test_parse_special_floats() {
        assert!(f64::from_cell("NaN").unwrap().is_nan());
        assert_eq!(f64::from_cell("inf").unwrap(), f64::INFINITY);
        assert_eq!(f64::from_cell("-inf").unwrap(), f64::NEG_INFINITY);
        assert!((f64::from_cell("1.25").unwrap() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_boolean() {
        assert!(bool::from_cell("true").unwrap());
        assert!(bool::from_cell("TRUE").unwrap());
        assert!(!bool::from_cell("0").unwrap());
        assert!(bool::from_cell("maybe").is_err());
    }

    #[test]
    fn test_parse_binary_hex() {
        assert_eq!(<Vec<u8>>::from_cell("DEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(<Vec<u8>>::from_cell("XYZ").is_err());
    }
}
