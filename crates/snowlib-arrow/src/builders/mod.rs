//! Arrow array builders fed by Snowflake cell text.
//!
//! One wrapper per Arrow type produced by the type mapping, plus a
//! [`BuilderFactory`] that picks the right one for a schema.

pub mod decimal;
pub mod factory;
pub mod primitive;
pub mod string;
pub mod temporal;

pub use decimal::{Decimal128BuilderWrapper, DecimalConfig};
pub use factory::BuilderFactory;
pub use primitive::{BooleanBuilderWrapper, Float64BuilderWrapper, Int64BuilderWrapper};
pub use string::{BinaryBuilderWrapper, StringBuilderWrapper};
pub use temporal::{
    Date32BuilderWrapper, Time64NanosecondBuilderWrapper, TimestampNanosecondBuilderWrapper,
};
