//! Conversion errors.
//!
//! One public struct wraps a private kind; callers classify failures with
//! the `is_*` predicates.

use thiserror::Error;

/// Failure while turning result cells into Arrow arrays, or Arrow values
/// back into cell text.
///
/// ```rust,ignore
/// match SnowflakeType::parse(&column.type_name) {
///     Err(err) if err.is_unsupported_type() => fall_back_to_text(column),
///     other => other?,
/// }
/// ```
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct ArrowConversionError {
    kind: ErrorKind,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub(crate) enum ErrorKind {
    /// A Snowflake type name with no Arrow mapping.
    #[error("unsupported Snowflake type: {type_name}")]
    UnsupportedType { type_name: String },

    /// Column count mismatch between schema and row.
    #[error("schema mismatch: expected {expected} columns, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    /// A cell that cannot be parsed as the target type.
    #[error("value conversion failed for column '{column}': {message}")]
    ValueConversion { column: String, message: String },

    /// Decimal value exceeds the declared precision.
    #[error("decimal overflow: precision {precision}, scale {scale}")]
    DecimalOverflow { precision: u8, scale: i8 },

    /// Error from Arrow library operations.
    #[error("arrow error: {0}")]
    Arrow(arrow_schema::ArrowError),

    /// JSON rendering of a nested value failed.
    #[error("json error: {0}")]
    Json(String),

    /// Invalid precision value for FIXED type.
    #[error("invalid precision: {0}")]
    InvalidPrecision(String),

    /// Invalid scale value for FIXED type.
    #[error("invalid scale: {0}")]
    InvalidScale(String),
}

impl ArrowConversionError {

    /// Type name absent from the mapping table.
    #[must_use]
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::UnsupportedType {
                type_name: type_name.into(),
            },
        }
    }

    /// Row width differs from the schema.
    #[must_use]
    pub const fn schema_mismatch(expected: usize, actual: usize) -> Self {
        Self {
            kind: ErrorKind::SchemaMismatch { expected, actual },
        }
    }

    /// Cell text that does not parse as the column type.
    #[must_use]
    pub fn value_conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ValueConversion {
                column: column.into(),
                message: message.into(),
            },
        }
    }

    /// Value needs more digits than the declared precision.
    #[must_use]
    pub const fn decimal_overflow(precision: u8, scale: i8) -> Self {
        Self {
            kind: ErrorKind::DecimalOverflow { precision, scale },
        }
    }

    /// JSON rendering of a nested value failed.
    #[must_use]
    pub fn json(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Json(message.into()),
        }
    }

    /// FIXED precision outside `1..=38`.
    #[must_use]
    pub fn invalid_precision(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidPrecision(message.into()),
        }
    }

    /// FIXED scale negative or above the precision.
    #[must_use]
    pub fn invalid_scale(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidScale(message.into()),
        }
    }

    /// Attach the real column name to a value conversion error.
    ///
    /// Builders only know the type they parse; the batch layer knows the
    /// column. Other error kinds are returned unchanged.
    #[must_use]
    pub(crate) fn in_column(self, name: &str) -> Self {
        match self.kind {
            ErrorKind::ValueConversion { message, .. } => Self::value_conversion(name, message),
            kind => Self { kind },
        }
    }

    /// Unknown type name.
    #[must_use]
    pub const fn is_unsupported_type(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedType { .. })
    }

    /// Row and schema widths differ.
    #[must_use]
    pub const fn is_schema_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::SchemaMismatch { .. })
    }

    /// Malformed cell text.
    #[must_use]
    pub const fn is_value_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::ValueConversion { .. })
    }

    /// Too many digits for the precision.
    #[must_use]
    pub const fn is_decimal_overflow(&self) -> bool {
        matches!(self.kind, ErrorKind::DecimalOverflow { .. })
    }

    /// Raised by arrow itself.
    #[must_use]
    pub const fn is_arrow_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Arrow(_))
    }

    /// Nested value could not be rendered as JSON.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.kind, ErrorKind::Json(_))
    }

    /// Bad FIXED precision.
    #[must_use]
    pub const fn is_invalid_precision(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidPrecision(_))
    }

    /// Bad FIXED scale.
    #[must_use]
    pub const fn is_invalid_scale(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidScale(_))
    }
}

impl From<arrow_schema::ArrowError> for ArrowConversionError {
    fn from(err: arrow_schema::ArrowError) -> Self {
        Self {
            kind: ErrorKind::Arrow(err),
        }
    }
}

impl From<serde_json::Error> for ArrowConversionError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ArrowConversionError>;
