//! Slot recycling policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use tierq_ir::QubitId;

/// How a freed slot is prepared before a new qubit moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecyclingPolicy {
    /// Insert a reset on the retiring qubit's wire before reuse. Safe for
    /// any circuit.
    ResetBased,
    /// Reuse the slot with no reset. Only sound when the retiring qubit is
    /// measured or otherwise known to be in a computational basis state;
    /// callers opt in explicitly.
    Immediate,
}

impl fmt::Display for RecyclingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecyclingPolicy::ResetBased => f.write_str("reset_based"),
            RecyclingPolicy::Immediate => f.write_str("immediate"),
        }
    }
}

/// A point where a slot changes hands between qubits.
///
/// Under [`RecyclingPolicy::ResetBased`] the compiler appends a reset to the
/// retiring qubit's wire for each of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPoint {
    /// Memory level of the recycled slot.
    pub level: u32,
    /// Slot index within the level.
    pub slot: u32,
    /// The qubit that previously occupied the slot.
    pub retired: QubitId,
    /// The qubit taking the slot over.
    pub incoming: QubitId,
    /// Operation step at which the new occupant's lifetime begins.
    pub step: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_display() {
        assert_eq!(RecyclingPolicy::ResetBased.to_string(), "reset_based");
        assert_eq!(RecyclingPolicy::Immediate.to_string(), "immediate");
    }
}
