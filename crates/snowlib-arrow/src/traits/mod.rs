//! Trait definitions for Snowflake to Arrow conversion.
//!
//! - [`sealed`] - Sealed trait pattern for API stability
//! - [`builder`] - Builder traits for Arrow array construction
//! - [`streaming`] - Batch sizing configuration

pub mod builder;
pub mod sealed;
pub mod streaming;

pub use builder::SnowflakeCompatibleBuilder;
pub use sealed::FromSnowflakeCell;
pub use streaming::BatchConfig;
