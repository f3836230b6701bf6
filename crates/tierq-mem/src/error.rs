//! Error types for the memory crate.

use thiserror::Error;

/// Errors raised while constructing a memory hierarchy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HierarchyError {
    /// A hierarchy must contain at least one level.
    #[error("Memory hierarchy has no levels")]
    Empty,

    /// Every level must hold at least one qubit.
    #[error("Memory level '{level}' has zero capacity")]
    ZeroCapacity {
        /// Name of the offending level.
        level: String,
    },

    /// Levels must be ordered fastest to slowest.
    #[error(
        "Memory level '{level}' has access time {access_time} below its \
         predecessor's {prev_access_time} (levels must be ordered fastest first)"
    )]
    Unordered {
        /// Name of the offending level.
        level: String,
        /// Access time of the offending level.
        access_time: u64,
        /// Access time of the preceding level.
        prev_access_time: u64,
    },

    /// A transfer override referenced a level index that does not exist.
    #[error("Transfer override references unknown level index {index}")]
    UnknownLevel {
        /// The out-of-range level index.
        index: u32,
    },

    /// Configuration could not be parsed.
    #[error("Invalid hierarchy config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Errors raised during qubit allocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AllocError {
    /// The circuit's peak concurrency exceeds the hierarchy's total capacity.
    #[error(
        "Circuit needs {peak} simultaneously live qubits but the hierarchy \
         holds only {capacity}"
    )]
    CapacityExceeded {
        /// Peak number of simultaneously live qubits.
        peak: usize,
        /// Total slot capacity across all levels.
        capacity: usize,
    },

    /// Static allocation ran out of slots.
    #[error("Static allocation needs {needed} slots but the hierarchy holds only {capacity}")]
    Exhausted {
        /// Number of qubits to place.
        needed: usize,
        /// Total slot capacity across all levels.
        capacity: usize,
    },
}

/// Result type for allocation operations.
pub type AllocResult<T> = Result<T, AllocError>;
