//! The tiered memory hierarchy.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::HierarchyError;
use crate::level::MemoryLevel;

/// A validated, immutable stack of memory tiers.
///
/// Levels are indexed fastest first: level 0 has the lowest access time.
/// Occupancy is not tracked here; that belongs to the [`Allocation`]
/// produced per compile candidate.
///
/// [`Allocation`]: crate::alloc::Allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryHierarchy {
    levels: Vec<MemoryLevel>,
    /// Explicit transfer times overriding the distance-based default.
    transfer_overrides: FxHashMap<(u32, u32), u64>,
}

/// Serde-facing shape of a hierarchy config file.
#[derive(Debug, Deserialize)]
struct HierarchyConfig {
    levels: Vec<MemoryLevel>,
    #[serde(default)]
    transfers: Vec<TransferConfig>,
}

#[derive(Debug, Deserialize)]
struct TransferConfig {
    from: u32,
    to: u32,
    time: u64,
}

impl MemoryHierarchy {
    /// Create a hierarchy from an ordered list of levels.
    ///
    /// Levels must be non-empty, each with nonzero capacity, ordered by
    /// nondecreasing access time.
    pub fn new(levels: Vec<MemoryLevel>) -> Result<Self, HierarchyError> {
        if levels.is_empty() {
            return Err(HierarchyError::Empty);
        }
        let mut prev_access: Option<u64> = None;
        for level in &levels {
            if level.capacity == 0 {
                return Err(HierarchyError::ZeroCapacity {
                    level: level.name.clone(),
                });
            }
            // Levels are declared fastest to slowest, strictly.
            if let Some(prev) = prev_access {
                if level.access_time <= prev {
                    return Err(HierarchyError::Unordered {
                        level: level.name.clone(),
                        access_time: level.access_time,
                        prev_access_time: prev,
                    });
                }
            }
            prev_access = Some(level.access_time);
        }
        Ok(Self {
            levels,
            transfer_overrides: FxHashMap::default(),
        })
    }

    /// The conventional three-tier hierarchy: a small fast processing tier,
    /// a mid-sized buffer tier, and a large long-term tier.
    pub fn standard() -> Self {
        let mut hierarchy = Self::new(vec![
            MemoryLevel::new("L1", 50, 1, 0.001, 100),
            MemoryLevel::new("L2", 100, 5, 0.0005, 500),
            MemoryLevel::new("L3", 200, 20, 0.0001, 2000),
        ])
        .expect("standard hierarchy is valid");

        for (from, to, time) in [(0, 1, 5), (1, 2, 15), (0, 2, 20)] {
            hierarchy.transfer_overrides.insert((from, to), time);
            hierarchy.transfer_overrides.insert((to, from), time);
        }
        hierarchy
    }

    /// Parse a hierarchy from a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, HierarchyError> {
        let config: HierarchyConfig = serde_json::from_str(json)?;
        let mut hierarchy = Self::new(config.levels)?;
        let num = hierarchy.num_levels() as u32;
        for t in config.transfers {
            if t.from >= num {
                return Err(HierarchyError::UnknownLevel { index: t.from });
            }
            if t.to >= num {
                return Err(HierarchyError::UnknownLevel { index: t.to });
            }
            hierarchy.transfer_overrides.insert((t.from, t.to), t.time);
        }
        Ok(hierarchy)
    }

    /// Override the transfer time between two levels (symmetric).
    pub fn set_transfer_time(&mut self, from: u32, to: u32, time: u64) {
        self.transfer_overrides.insert((from, to), time);
        self.transfer_overrides.insert((to, from), time);
    }

    /// Number of levels in the hierarchy.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Get a level by index.
    #[inline]
    pub fn level(&self, index: u32) -> Option<&MemoryLevel> {
        self.levels.get(index as usize)
    }

    /// Iterate over levels, fastest first.
    pub fn levels(&self) -> impl Iterator<Item = &MemoryLevel> {
        self.levels.iter()
    }

    /// Total slot capacity across all levels.
    pub fn total_capacity(&self) -> usize {
        self.levels.iter().map(|l| l.capacity).sum()
    }

    /// Slot capacity of a level, or 0 for an out-of-range index.
    pub fn capacity_of(&self, level: u32) -> usize {
        self.levels.get(level as usize).map_or(0, |l| l.capacity)
    }

    /// Access latency of a level. Out-of-range indices land on the slowest
    /// level, which keeps cost estimates pessimistic rather than wrong.
    pub fn access_time(&self, level: u32) -> u64 {
        self.levels
            .get(level as usize)
            .or_else(|| self.levels.last())
            .map_or(0, |l| l.access_time)
    }

    /// Per-operation error rate of a level.
    pub fn error_rate(&self, level: u32) -> f64 {
        self.levels
            .get(level as usize)
            .or_else(|| self.levels.last())
            .map_or(0.0, |l| l.error_rate)
    }

    /// Time to move a qubit state between two levels.
    ///
    /// Uses an explicit override when one exists, otherwise the sum of both
    /// access times scaled by tier distance.
    pub fn transfer_time(&self, from: u32, to: u32) -> u64 {
        if from == to {
            return 0;
        }
        if let Some(&t) = self.transfer_overrides.get(&(from, to)) {
            return t;
        }
        let distance = from.abs_diff(to) as u64;
        (self.access_time(from) + self.access_time(to)) * distance
    }

    /// Flat slot id of `(level, slot)`, counting slots fastest level first.
    pub fn flat_index(&self, level: u32, slot: u32) -> u32 {
        let offset: usize = self
            .levels
            .iter()
            .take(level as usize)
            .map(|l| l.capacity)
            .sum();
        offset as u32 + slot
    }

    /// Inverse of [`flat_index`](Self::flat_index).
    pub fn level_of_flat(&self, flat: u32) -> (u32, u32) {
        let mut remaining = flat as usize;
        for (i, level) in self.levels.iter().enumerate() {
            if remaining < level.capacity {
                return (i as u32, remaining as u32);
            }
            remaining -= level.capacity;
        }
        // Past the end: clamp to the last slot of the slowest level.
        let last = self.levels.len() - 1;
        (last as u32, self.levels[last].capacity as u32 - 1)
    }
}
