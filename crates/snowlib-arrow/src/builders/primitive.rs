//! Primitive type builders (Int64, Float64, Boolean).
//!
//! Each wrapper parses the cell through [`FromSnowflakeCell`], so the
//! textual format of every primitive lives in one place.

use std::sync::Arc;

use arrow_array::ArrayRef;
use arrow_array::builder::{BooleanBuilder, Float64Builder, Int64Builder};

use crate::Result;
use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::traits::sealed::FromSnowflakeCell;
use crate::traits::sealed::private::Sealed;

macro_rules! primitive_wrapper {
    ($(#[$doc:meta])* $name:ident, $builder:ty, $native:ty) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            builder: $builder,
            len: usize,
        }

        impl $name {
            /// Create a new builder with the given row capacity.
            #[must_use]
            pub fn new(capacity: usize) -> Self {
                Self {
                    builder: <$builder>::with_capacity(capacity),
                    len: 0,
                }
            }
        }

        impl Sealed for $name {}

        impl SnowflakeCompatibleBuilder for $name {
            fn append_cell(&mut self, cell: &str) -> Result<()> {
                let value = <$native>::from_cell(cell)?;
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
    };
}

primitive_wrapper!(
    /// Builder for Arrow Int64 arrays (FIXED with scale 0).
    Int64BuilderWrapper,
    Int64Builder,
    i64
);

primitive_wrapper!(
    /// Builder for Arrow Float64 arrays (REAL).
    Float64BuilderWrapper,
    Float64Builder,
    f64
);

primitive_wrapper!(
    /// Builder for Arrow Boolean arrays.
    BooleanBuilderWrapper,
    BooleanBuilder,
    bool
);
