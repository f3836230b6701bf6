//! A single tier of the memory hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One tier of qubit storage.
///
/// Tiers trade capacity against speed: a fast tier has few slots and low
/// access latency, a slow tier has many slots, higher latency, and usually a
/// longer coherence time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryLevel {
    /// Human-readable name (L1, L2, ...).
    pub name: String,
    /// Maximum number of qubits this tier can hold at once.
    pub capacity: usize,
    /// Latency of operating on a qubit resident in this tier.
    pub access_time: u64,
    /// Per-operation error rate for qubits resident in this tier.
    pub error_rate: f64,
    /// How long a qubit survives in this tier before decohering.
    pub coherence_time: u64,
}

impl MemoryLevel {
    /// Create a new memory level.
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        access_time: u64,
        error_rate: f64,
        coherence_time: u64,
    ) -> Self {
        Self {
            name: name.into(),
            capacity,
            access_time,
            error_rate,
            coherence_time,
        }
    }
}

impl fmt::Display for MemoryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (cap={}, access={}, err={})",
            self.name, self.capacity, self.access_time, self.error_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display() {
        let l1 = MemoryLevel::new("L1", 50, 1, 0.001, 100);
        assert_eq!(format!("{l1}"), "L1 (cap=50, access=1, err=0.001)");
    }
}
