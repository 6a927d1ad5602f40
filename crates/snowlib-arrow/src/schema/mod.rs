//! Arrow schema construction from result metadata.

pub mod mapping;

pub use mapping::SchemaMapper;
