//! Builder traits for Arrow array construction.
//!
//! This module defines the [`SnowflakeCompatibleBuilder`] trait that all Arrow
//! builders must implement to accept Snowflake result cells.

use arrow_array::ArrayRef;

use super::sealed::private::Sealed;

/// Marker trait for Arrow builders that can accept Snowflake cells.
///
/// Sealed to prevent external implementations that might violate
/// invariants around null handling and type safety.
///
/// # Implementors
///
/// - `Int64BuilderWrapper`, `Float64BuilderWrapper`, `BooleanBuilderWrapper`
/// - `Decimal128BuilderWrapper`
/// - `StringBuilderWrapper`, `BinaryBuilderWrapper`
/// - `Date32BuilderWrapper`, `Time64NanosecondBuilderWrapper`,
///   `TimestampNanosecondBuilderWrapper`
pub trait SnowflakeCompatibleBuilder: Sealed + Send {
    /// Append one non-null cell to this builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell cannot be converted to the target type.
    fn append_cell(&mut self, cell: &str) -> crate::Result<()>;

    /// Append a null value to this builder.
    fn append_null(&mut self);

    /// Append a cell that may be SQL NULL.
    ///
    /// # Errors
    ///
    /// Returns an error if a present cell cannot be converted.
    fn append_option(&mut self, cell: Option<&str>) -> crate::Result<()> {
        match cell {
            Some(text) => self.append_cell(text),
            None => {
                self.append_null();
                Ok(())
            }
        }
    }

    /// Finish building and return the Arrow array.
    ///
    /// After calling this method, the builder is reset and can be reused.
    fn finish(&mut self) -> ArrayRef;

    /// Reset the builder, clearing all data while preserving capacity.
    fn reset(&mut self) {
        let _ = self.finish();
    }

    /// Returns the number of values (including nulls) appended so far.
    fn len(&self) -> usize;

    /// Returns true if no values have been appended.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity hint for this builder, if known.
    fn capacity(&self) -> Option<usize> {
        None
    }
}
