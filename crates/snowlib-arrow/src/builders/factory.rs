//! Picks a builder for each Arrow type the type mapping can produce.

use arrow_schema::{DataType, Schema, TimeUnit};

use super::decimal::Decimal128BuilderWrapper;
use super::primitive::{BooleanBuilderWrapper, Float64BuilderWrapper, Int64BuilderWrapper};
use super::string::{BinaryBuilderWrapper, StringBuilderWrapper};
use super::temporal::{
    Date32BuilderWrapper, Time64NanosecondBuilderWrapper, TimestampNanosecondBuilderWrapper,
};
use crate::Result;
use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::traits::streaming::BatchConfig;

/// Average bytes reserved per row for text and binary columns when no
/// explicit sizing is given.
const TEXT_BYTES_PER_ROW: usize = 32;
const BINARY_BYTES_PER_ROW: usize = 64;

/// Creates boxed builders sized for one batch.
#[derive(Debug, Clone)]
pub struct BuilderFactory {
    rows: usize,
    text_bytes: usize,
    binary_bytes: usize,
}

impl BuilderFactory {
    /// Size builders for `rows` rows, guessing the variable-length data.
    #[must_use]
    pub const fn new(rows: usize) -> Self {
        Self {
            rows,
            text_bytes: rows * TEXT_BYTES_PER_ROW,
            binary_bytes: rows * BINARY_BYTES_PER_ROW,
        }
    }

    /// Size builders from the processor's batch settings.
    #[must_use]
    pub const fn from_config(config: &BatchConfig) -> Self {
        Self {
            rows: config.batch_size,
            text_bytes: config.string_capacity,
            binary_bytes: config.binary_capacity,
        }
    }

    /// Builder for one column.
    ///
    /// Anything without a dedicated builder is collected as `Utf8` so the
    /// cell text survives unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a `Decimal128` type carries invalid precision or
    /// scale.
    pub fn create_builder(
        &self,
        data_type: &DataType,
    ) -> Result<Box<dyn SnowflakeCompatibleBuilder>> {
        let rows = self.rows;
        Ok(match data_type {
            DataType::Int64 => Box::new(Int64BuilderWrapper::new(rows)),
            DataType::Float64 => Box::new(Float64BuilderWrapper::new(rows)),
            DataType::Boolean => Box::new(BooleanBuilderWrapper::new(rows)),
            DataType::Decimal128(precision, scale) => {
                Box::new(Decimal128BuilderWrapper::new(rows, *precision, *scale)?)
            }
            DataType::Binary => Box::new(BinaryBuilderWrapper::new(rows, self.binary_bytes)),
            DataType::Date32 => Box::new(Date32BuilderWrapper::new(rows)),
            DataType::Time64(TimeUnit::Nanosecond) => {
                Box::new(Time64NanosecondBuilderWrapper::new(rows))
            }
            DataType::Timestamp(TimeUnit::Nanosecond, tz) => Box::new(
                TimestampNanosecondBuilderWrapper::with_timezone(rows, tz.clone()),
            ),
            _ => Box::new(StringBuilderWrapper::new(rows, self.text_bytes)),
        })
    }

    /// One builder per schema field, in field order.
    ///
    /// # Errors
    ///
    /// Returns the first builder construction error.
    pub fn create_builders_for_schema(
        &self,
        schema: &Schema,
    ) -> Result<Vec<Box<dyn SnowflakeCompatibleBuilder>>> {
        schema
            .fields()
            .iter()
            .map(|field| self.create_builder(field.data_type()))
            .collect()
    }
}

impl Default for BuilderFactory {
    fn default() -> Self {
        Self::new(1024)
    }
}
