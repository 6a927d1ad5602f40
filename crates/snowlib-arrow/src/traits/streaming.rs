//! Batch sizing for streamed result conversion.
//!
//! Snowflake returns large results in partitions of arbitrary size. The
//! processor re-chunks them into batches of a fixed row count described
//! by [`BatchConfig`].

/// Configuration for batch processing.
///
/// Controls memory allocation and processing behavior for batch conversion.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of rows per batch.
    ///
    /// Default: 10000.
    pub batch_size: usize,

    /// Initial capacity for string builders (bytes).
    ///
    /// Default: 1MB.
    pub string_capacity: usize,

    /// Initial capacity for binary builders (bytes).
    ///
    /// Default: 1MB.
    pub binary_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            string_capacity: 1024 * 1024,
            binary_capacity: 1024 * 1024,
        }
    }
}

impl BatchConfig {
    /// Create a new configuration with the specified batch size.
    ///
    /// A zero batch size is treated as one row.
    #[must_use]
    pub fn with_batch_size(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            ..Default::default()
        }
    }

    /// Set the string builder capacity.
    #[must_use]
    pub const fn string_capacity(mut self, capacity: usize) -> Self {
        self.string_capacity = capacity;
        self
    }

    /// Set the binary builder capacity.
    #[must_use]
    pub const fn binary_capacity(mut self, capacity: usize) -> Self {
        self.binary_capacity = capacity;
        self
    }

    /// Create a configuration optimized for small result sets.
    #[must_use]
    pub const fn small() -> Self {
        Self {
            batch_size: 1024,
            string_capacity: 64 * 1024,
            binary_capacity: 64 * 1024,
        }
    }

    /// Create a configuration optimized for large result sets.
    #[must_use]
    pub const fn large() -> Self {
        Self {
            batch_size: 131_072,
            string_capacity: 8 * 1024 * 1024,
            binary_capacity: 8 * 1024 * 1024,
        }
    }
}
