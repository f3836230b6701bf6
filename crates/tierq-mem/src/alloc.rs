//! Qubit-to-slot allocation.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tierq_ir::QubitId;
use tracing::debug;

use crate::error::{AllocError, AllocResult};
use crate::hierarchy::MemoryHierarchy;
use crate::lifetime::{Lifetime, LifetimeTable};
use crate::recycle::{RecyclingPolicy, ResetPoint};

/// How qubits are assigned to physical slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationStrategy {
    /// One slot per qubit for the whole circuit. Simple, never recycles.
    Static,
    /// Lifetime-driven packing: disjoint lifetimes share slots.
    Lifetime,
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationStrategy::Static => f.write_str("static"),
            AllocationStrategy::Lifetime => f.write_str("lifetime"),
        }
    }
}

/// A qubit's residency in one slot starting at a given step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Memory level index (fastest first).
    pub level: u32,
    /// Slot index within the level.
    pub slot: u32,
    /// First operation step this placement covers.
    pub from_step: u32,
}

/// Where one qubit lives over its lifetime.
///
/// Most records hold a single placement. Capacity pressure can split a
/// lifetime across slots, producing one placement per residency; the
/// scheduler turns each boundary into a transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    /// The allocated qubit.
    pub qubit: QubitId,
    /// Residencies ordered by `from_step`.
    pub placements: Vec<Placement>,
    /// The qubit's live span.
    pub lifetime: Lifetime,
}

impl AllocationRecord {
    /// The placement covering an operation step.
    ///
    /// Steps before the first placement map to the first placement; steps
    /// past the lifetime map to the last. Both arise for instructions the
    /// compiler appends after analysis (resets, routing swaps).
    pub fn placement_at(&self, step: u32) -> &Placement {
        let mut current = &self.placements[0];
        for p in &self.placements {
            if p.from_step <= step {
                current = p;
            } else {
                break;
            }
        }
        current
    }
}

/// The result of allocating one circuit against a hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    /// Strategy that produced this allocation.
    pub strategy: AllocationStrategy,
    /// Recycling policy in effect.
    pub policy: RecyclingPolicy,
    /// Per-qubit placement records.
    pub records: FxHashMap<QubitId, AllocationRecord>,
    /// Slot hand-overs that require (under reset-based recycling) a reset.
    pub resets: Vec<ResetPoint>,
    /// Number of distinct physical slots ever occupied.
    pub slots_used: usize,
}

impl Allocation {
    /// Placement record for a qubit, if it was allocated.
    pub fn record(&self, qubit: QubitId) -> Option<&AllocationRecord> {
        self.records.get(&qubit)
    }

    /// The `(level, slot)` a qubit occupies at an operation step.
    pub fn location_at(&self, qubit: QubitId, step: u32) -> Option<(u32, u32)> {
        let p = self.records.get(&qubit)?.placement_at(step);
        Some((p.level, p.slot))
    }

    /// Number of lifetime splits across all qubits.
    pub fn num_relocations(&self) -> usize {
        self.records
            .values()
            .map(|r| r.placements.len().saturating_sub(1))
            .sum()
    }

    /// Renumber every recorded step after instructions were spliced into
    /// the circuit.
    ///
    /// `map[old]` is the new step of the operation that sat at `old` when
    /// this allocation was computed. Rebuilders that insert resets or
    /// routing swaps return such a map; applying it keeps placements,
    /// lifetimes, and reset points anchored to the same operations in the
    /// rebuilt circuit.
    pub fn remap_steps(&mut self, map: &[u32]) {
        let remap = |step: u32| map.get(step as usize).copied().unwrap_or(step);
        for record in self.records.values_mut() {
            for placement in &mut record.placements {
                placement.from_step = remap(placement.from_step);
            }
            record.lifetime.first_use = remap(record.lifetime.first_use);
            record.lifetime.last_use = remap(record.lifetime.last_use);
        }
        for reset in &mut self.resets {
            reset.step = remap(reset.step);
        }
    }
}

/// Assigns qubits to hierarchy slots according to a strategy and recycling
/// policy.
pub struct QubitAllocator<'h> {
    hierarchy: &'h MemoryHierarchy,
    strategy: AllocationStrategy,
    policy: RecyclingPolicy,
}

impl<'h> QubitAllocator<'h> {
    /// Create an allocator.
    pub fn new(
        hierarchy: &'h MemoryHierarchy,
        strategy: AllocationStrategy,
        policy: RecyclingPolicy,
    ) -> Self {
        Self {
            hierarchy,
            strategy,
            policy,
        }
    }

    /// Allocate every used qubit in the lifetime table.
    ///
    /// Fails up front when the hierarchy cannot possibly hold the circuit,
    /// so callers never see a partially placed allocation.
    pub fn allocate(&self, table: &LifetimeTable) -> AllocResult<Allocation> {
        let allocation = match self.strategy {
            AllocationStrategy::Static => self.allocate_static(table)?,
            AllocationStrategy::Lifetime => self.allocate_lifetime(table)?,
        };
        debug!(
            strategy = %self.strategy,
            policy = %self.policy,
            qubits = allocation.records.len(),
            slots_used = allocation.slots_used,
            resets = allocation.resets.len(),
            "allocation complete"
        );
        Ok(allocation)
    }

    /// Static allocation: qubit i gets the i-th slot, fastest levels first,
    /// held for the whole circuit.
    fn allocate_static(&self, table: &LifetimeTable) -> AllocResult<Allocation> {
        let qubits = table.live_qubits();
        let capacity = self.hierarchy.total_capacity();
        if qubits.len() > capacity {
            return Err(AllocError::Exhausted {
                needed: qubits.len(),
                capacity,
            });
        }

        let mut records = FxHashMap::default();
        for (i, &qubit) in qubits.iter().enumerate() {
            let (level, slot) = self.hierarchy.level_of_flat(i as u32);
            let lifetime = table
                .lifetime(qubit)
                .ok_or(AllocError::Exhausted {
                    needed: qubits.len(),
                    capacity,
                })?;
            records.insert(
                qubit,
                AllocationRecord {
                    qubit,
                    placements: vec![Placement {
                        level,
                        slot,
                        from_step: 0,
                    }],
                    lifetime,
                },
            );
        }

        Ok(Allocation {
            strategy: self.strategy,
            policy: self.policy,
            records,
            resets: vec![],
            slots_used: qubits.len(),
        })
    }

    /// Lifetime allocation: pack disjoint lifetimes into shared slots.
    ///
    /// Qubits are placed most-used first (ties: shorter lifetime, then lower
    /// id) so heavily used qubits claim the fastest tiers. Each qubit takes
    /// the slot that stays free longest from its current step, preferring
    /// faster tiers among equals; when no slot lasts the full lifetime, the
    /// residency is split and continues in another slot.
    fn allocate_lifetime(&self, table: &LifetimeTable) -> AllocResult<Allocation> {
        let capacity = self.hierarchy.total_capacity();
        let peak = table.peak_concurrency();
        if peak > capacity {
            return Err(AllocError::CapacityExceeded { peak, capacity });
        }

        let mut order = table.live_qubits();
        order.sort_by(|&a, &b| {
            table
                .usage(b)
                .cmp(&table.usage(a))
                .then_with(|| {
                    let la = table.lifetime(a).map_or(0, |lt| lt.len());
                    let lb = table.lifetime(b).map_or(0, |lt| lt.len());
                    la.cmp(&lb)
                })
                .then(a.cmp(&b))
        });

        // Busy intervals per flat slot: (start, end, occupant).
        let mut busy: Vec<Vec<(u32, u32, QubitId)>> = vec![vec![]; capacity];
        let mut records = FxHashMap::default();
        let mut resets = vec![];

        for qubit in order {
            let Some(lifetime) = table.lifetime(qubit) else {
                continue;
            };
            let mut placements = vec![];
            let mut cur = lifetime.first_use;

            while cur <= lifetime.last_use {
                let mut best: Option<(u32, usize)> = None;
                for (flat, intervals) in busy.iter().enumerate() {
                    if let Some(end) = free_extent(intervals, cur, lifetime.last_use) {
                        if best.is_none_or(|(best_end, _)| end > best_end) {
                            best = Some((end, flat));
                        }
                        if end == lifetime.last_use {
                            break;
                        }
                    }
                }

                // Peak fits in capacity, so some slot is free at `cur`.
                let Some((end, flat)) = best else {
                    return Err(AllocError::CapacityExceeded { peak, capacity });
                };

                let (level, slot) = self.hierarchy.level_of_flat(flat as u32);

                // First placement into a previously vacated slot is a
                // recycling hand-over.
                if placements.is_empty() {
                    let prior = busy[flat]
                        .iter()
                        .filter(|&&(_, e, _)| e < cur)
                        .max_by_key(|&&(_, e, _)| e);
                    if let Some(&(_, _, retired)) = prior {
                        if self.policy == RecyclingPolicy::ResetBased {
                            resets.push(ResetPoint {
                                level,
                                slot,
                                retired,
                                incoming: qubit,
                                step: cur,
                            });
                        }
                    }
                }

                placements.push(Placement {
                    level,
                    slot,
                    from_step: cur,
                });
                busy[flat].push((cur, end, qubit));
                busy[flat].sort_unstable_by_key(|&(s, _, _)| s);
                cur = end + 1;
            }

            records.insert(
                qubit,
                AllocationRecord {
                    qubit,
                    placements,
                    lifetime,
                },
            );
        }

        let slots_used = busy.iter().filter(|v| !v.is_empty()).count();

        Ok(Allocation {
            strategy: self.strategy,
            policy: self.policy,
            records,
            resets,
            slots_used,
        })
    }
}

/// How long a slot stays free from `start`, up to `want_end`.
///
/// Returns `None` when `start` itself is occupied.
fn free_extent(intervals: &[(u32, u32, QubitId)], start: u32, want_end: u32) -> Option<u32> {
    let mut end = want_end;
    for &(s, e, _) in intervals {
        if s <= start && start <= e {
            return None;
        }
        if s > start {
            end = end.min(s - 1);
        }
    }
    Some(end)
}
