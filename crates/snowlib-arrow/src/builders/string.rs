//! Variable-length builders: `Utf8` and `Binary`.
//!
//! TEXT cells and the JSON text of semi-structured columns are stored
//! unchanged. BINARY cells arrive hex encoded (the default
//! `BINARY_OUTPUT_FORMAT`) and are decoded before they are appended.

use std::sync::Arc;

use arrow_array::ArrayRef;
use arrow_array::builder::{BinaryBuilder, StringBuilder};

use crate::Result;
use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::traits::sealed::FromSnowflakeCell;
use crate::traits::sealed::private::Sealed;

macro_rules! var_len_wrapper {
    ($(#[$doc:meta])* $name:ident, $builder:ty, |$cell:ident| $value:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name {
            builder: $builder,
            len: usize,
        }

        impl $name {
            /// Reserve `rows` slots and `bytes` of value data.
            #[must_use]
            pub fn new(rows: usize, bytes: usize) -> Self {
                Self {
                    builder: <$builder>::with_capacity(rows, bytes),
                    len: 0,
                }
            }
        }

        impl Sealed for $name {}

        impl SnowflakeCompatibleBuilder for $name {
            fn append_cell(&mut self, $cell: &str) -> Result<()> {
                self.builder.append_value($value);
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
        }
    };
}

var_len_wrapper!(
    /// Utf8 arrays for TEXT and semi-structured columns.
    StringBuilderWrapper,
    StringBuilder,
    |cell| cell
);

var_len_wrapper!(
    /// Binary arrays decoded from hex cells.
    BinaryBuilderWrapper,
    BinaryBuilder,
    |cell| <Vec<u8>>::from_cell(cell)?
);
