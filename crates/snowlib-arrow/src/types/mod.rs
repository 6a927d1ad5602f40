//! Type definitions and mappings.

pub mod arrow;
pub mod conversion;
pub mod snowflake;
