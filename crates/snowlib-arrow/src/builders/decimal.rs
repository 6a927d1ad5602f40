//! Decimal128 builder with precision and scale validation.
//!
//! Handles Snowflake FIXED columns whose precision exceeds 18 digits or
//! whose scale is non-zero. Cells arrive as plain decimal text such as
//! `"-123.45"`.

use std::sync::Arc;

use arrow_array::ArrayRef;
use arrow_array::builder::Decimal128Builder;
use arrow_schema::DataType;

use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::traits::sealed::private::Sealed;
use crate::types::arrow::MAX_DECIMAL_PRECISION;
use crate::{ArrowConversionError, Result};

/// Validated decimal configuration.
///
/// Ensures precision and scale are valid at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalConfig {
    precision: u8,
    scale: i8,
}

impl DecimalConfig {
    /// Create a new decimal configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if precision is outside `1..=38` or scale is
    /// outside `0..=precision`.
    pub fn new(precision: u8, scale: i8) -> Result<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(ArrowConversionError::invalid_precision(format!(
                "precision {precision} outside 1..={MAX_DECIMAL_PRECISION}"
            )));
        }
        if scale < 0 || scale.unsigned_abs() > precision {
            return Err(ArrowConversionError::invalid_scale(format!(
                "scale {scale} outside 0..={precision}"
            )));
        }
        Ok(Self { precision, scale })
    }

    /// Returns the precision value.
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Returns the scale value.
    #[must_use]
    pub const fn scale(&self) -> i8 {
        self.scale
    }

    /// Parse decimal text into the unscaled `i128` representation.
    ///
    /// Fractional digits beyond the scale are accepted only when they are
    /// zeros.
    ///
    /// # Errors
    ///
    /// Returns `ValueConversion` for malformed text or for non-zero digits
    /// beyond the scale, and `DecimalOverflow` when the value needs more
    /// digits than the precision allows.
    pub fn parse_unscaled(&self, cell: &str) -> Result<i128> {
        let text = cell.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        let well_formed = !(int_part.is_empty() && frac_part.is_empty())
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(ArrowConversionError::value_conversion(
                "decimal",
                format!("invalid decimal format: {cell}"),
            ));
        }

        let target_scale = self.scale.unsigned_abs() as usize;
        if frac_part.len() > target_scale && frac_part[target_scale..].bytes().any(|b| b != b'0') {
            return Err(ArrowConversionError::value_conversion(
                "decimal",
                format!("{cell} has more than {target_scale} fractional digits"),
            ));
        }

        let mut scaled = String::with_capacity(int_part.len() + target_scale);
        scaled.push_str(int_part.trim_start_matches('0'));
        if frac_part.len() >= target_scale {
            scaled.push_str(&frac_part[..target_scale]);
        } else {
            scaled.push_str(frac_part);
            scaled.extend(std::iter::repeat_n('0', target_scale - frac_part.len()));
        }

        let significant = scaled.trim_start_matches('0');
        if significant.len() > usize::from(self.precision) {
            return Err(ArrowConversionError::decimal_overflow(self.precision, self.scale));
        }
        if significant.is_empty() {
            return Ok(0);
        }

        let magnitude: i128 = significant.parse().map_err(|e| {
            ArrowConversionError::value_conversion(
                "decimal",
                format!(
                    "cannot convert {cell} to Decimal128({}, {}): {e}",
                    self.precision, self.scale
                ),
            )
        })?;
        Ok(if negative { -magnitude } else { magnitude })
    }
}

/// Builder for Arrow Decimal128 arrays.
#[derive(Debug)]
pub struct Decimal128BuilderWrapper {
    builder: Decimal128Builder,
    config: DecimalConfig,
    len: usize,
}

impl Decimal128BuilderWrapper {
    /// Create a new decimal builder with validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if precision or scale are invalid.
    pub fn new(capacity: usize, precision: u8, scale: i8) -> Result<Self> {
        Ok(Self::from_config(capacity, DecimalConfig::new(precision, scale)?))
    }

    /// Create from validated config.
    #[must_use]
    pub fn from_config(capacity: usize, config: DecimalConfig) -> Self {
        let builder = Decimal128Builder::with_capacity(capacity)
            .with_data_type(DataType::Decimal128(config.precision(), config.scale()));

        Self {
            builder,
            config,
            len: 0,
        }
    }
}

impl Sealed for Decimal128BuilderWrapper {}

impl SnowflakeCompatibleBuilder for Decimal128BuilderWrapper {
    fn append_cell(&mut self, cell: &str) -> Result<()> {
        let value = self.config.parse_unscaled(cell)?;
        self.builder.append_value(value);
        self.len += 1;
        Ok(())
    }

    fn append_null(&mut self) {
        self.builder.append_null();
        self.len += 1;
    }

    fn finish(&mut self) -> ArrayRef {
        self.len = 0;
        Arc::new(self.builder.finish())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.builder.capacity())
    }
}
