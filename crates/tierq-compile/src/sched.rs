//! Layered ASAP gate scheduling over allocated slots.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tierq_ir::{CircuitDag, NodeIndex, QubitId};
use tierq_mem::{Allocation, MemoryHierarchy};

use crate::error::CompileResult;

/// A tier relocation charged to the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOp {
    /// The relocated qubit.
    pub qubit: QubitId,
    pub from_level: u32,
    pub to_level: u32,
    /// Layer the transfer is charged to.
    pub layer: u32,
    /// Latency charged, from the hierarchy's transfer table.
    pub time: u64,
}

/// One parallel timestep of the schedule.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    /// Operations executing in this timestep.
    pub ops: Vec<NodeIndex>,
    /// Latency: slowest operand tier access plus transfer charges.
    pub latency: u64,
}

/// The result of scheduling: a layering of the DAG with tier-aware
/// latency accounting.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub layers: Vec<Layer>,
    /// Number of layers.
    pub depth: usize,
    /// Sum of layer latencies.
    pub duration: u64,
    /// Tier relocations inserted between consecutive uses of a qubit.
    pub transfers: Vec<TransferOp>,
}

/// Assigns every operation to the earliest layer in which its
/// dependencies are complete and its operand slots are free.
///
/// Slots are shared across recycled qubits, so slot usage is serialized
/// in analysis-step order: an operation cannot run until every earlier
/// operation on each of its operand slots has been scheduled. Within a
/// layer no slot is used twice.
pub struct GateScheduler<'h> {
    hierarchy: &'h MemoryHierarchy,
}

impl<'h> GateScheduler<'h> {
    pub fn new(hierarchy: &'h MemoryHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Slot key for exclusivity checks. Unallocated qubits get a
    /// private key past the flat slot range.
    fn slot_key(&self, allocation: &Allocation, qubit: QubitId, step: u32) -> u64 {
        match allocation.location_at(qubit, step) {
            Some((level, slot)) => u64::from(self.hierarchy.flat_index(level, slot)),
            None => u64::from(self.hierarchy.total_capacity() as u32) + u64::from(qubit.0),
        }
    }

    /// Schedule the DAG, stamping each instruction's `timestep`.
    pub fn run(
        &self,
        dag: &mut CircuitDag,
        allocation: &Allocation,
    ) -> CompileResult<Schedule> {
        // Enumerate ops once; the index doubles as the analysis step for
        // placement lookups.
        let ordered: Vec<NodeIndex> = dag.topological_ops().map(|(n, _)| n).collect();
        let step_of: FxHashMap<NodeIndex, u32> = ordered
            .iter()
            .enumerate()
            .map(|(i, &n)| (n, i as u32))
            .collect();

        // Operand qubits and slot keys per op.
        let mut op_qubits: FxHashMap<NodeIndex, Vec<QubitId>> = FxHashMap::default();
        for (node, inst) in dag.topological_ops() {
            op_qubits.insert(node, inst.qubits.clone());
        }

        // Per-slot queues in step order serialize recycled slots.
        let mut slot_queue: FxHashMap<u64, Vec<NodeIndex>> = FxHashMap::default();
        for &node in &ordered {
            let step = step_of[&node];
            let mut seen = FxHashSet::default();
            for &q in &op_qubits[&node] {
                let key = self.slot_key(allocation, q, step);
                if seen.insert(key) {
                    slot_queue.entry(key).or_default().push(node);
                }
            }
        }
        let mut slot_cursor: FxHashMap<u64, usize> = FxHashMap::default();

        // Op-level predecessor counts from wire edges.
        let mut pending_preds: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        let mut op_successors: FxHashMap<NodeIndex, Vec<NodeIndex>> = FxHashMap::default();
        for &node in &ordered {
            let mut count = 0;
            for edge in dag
                .graph()
                .edges_directed(node, petgraph::Direction::Incoming)
            {
                use petgraph::visit::EdgeRef;
                let source = edge.source();
                if dag.graph()[source].is_op() {
                    count += 1;
                    op_successors.entry(source).or_default().push(node);
                }
            }
            pending_preds.insert(node, count);
        }

        let mut ready: Vec<NodeIndex> = ordered
            .iter()
            .copied()
            .filter(|n| pending_preds[n] == 0)
            .collect();
        let mut scheduled: FxHashSet<NodeIndex> = FxHashSet::default();
        let mut last_level: FxHashMap<QubitId, u32> = FxHashMap::default();
        let mut schedule = Schedule::default();

        while scheduled.len() < ordered.len() {
            // Lowest operand qubit id first.
            ready.sort_by_key(|n| {
                op_qubits[n]
                    .iter()
                    .map(|q| q.0)
                    .min()
                    .unwrap_or(u32::MAX)
            });

            let layer_index = schedule.layers.len() as u32;
            let mut layer = Layer::default();
            let mut used_slots: FxHashSet<u64> = FxHashSet::default();
            let mut deferred: Vec<NodeIndex> = vec![];

            for node in std::mem::take(&mut ready) {
                let step = step_of[&node];
                let keys: Vec<u64> = op_qubits[&node]
                    .iter()
                    .map(|&q| self.slot_key(allocation, q, step))
                    .collect();

                // Every operand slot must be free in this layer and the
                // op must be next in line on each of its slot queues.
                let slots_free = keys.iter().all(|k| !used_slots.contains(k));
                let at_front = keys.iter().all(|k| {
                    let cursor = slot_cursor.get(k).copied().unwrap_or(0);
                    slot_queue[k].get(cursor) == Some(&node)
                });
                if !slots_free || !at_front {
                    deferred.push(node);
                    continue;
                }

                for k in &keys {
                    used_slots.insert(*k);
                    *slot_cursor.entry(*k).or_insert(0) += 1;
                }

                // Charge a transfer when the operand's tier changed since
                // its previous use.
                let mut access = 0u64;
                let mut transfer_charge = 0u64;
                for &q in &op_qubits[&node] {
                    if let Some((level, _)) = allocation.location_at(q, step) {
                        if let Some(&prev) = last_level.get(&q) {
                            if prev != level {
                                let time = self.hierarchy.transfer_time(prev, level);
                                schedule.transfers.push(TransferOp {
                                    qubit: q,
                                    from_level: prev,
                                    to_level: level,
                                    layer: layer_index,
                                    time,
                                });
                                transfer_charge += time;
                            }
                        }
                        last_level.insert(q, level);
                        access = access.max(self.hierarchy.access_time(level));
                    }
                }
                layer.latency = layer.latency.max((access + transfer_charge).max(1));

                if let Some(inst) = dag.get_instruction_mut(node) {
                    inst.timestep = Some(layer_index);
                }
                layer.ops.push(node);
                scheduled.insert(node);

                for succ in op_successors.get(&node).into_iter().flatten() {
                    if let Some(count) = pending_preds.get_mut(succ) {
                        *count -= 1;
                        if *count == 0 {
                            deferred.push(*succ);
                        }
                    }
                }
            }

            // Successors unlocked this layer run strictly later; they sit
            // in `deferred` and are picked up next round.
            ready = deferred;

            debug_assert!(!layer.ops.is_empty(), "scheduler made no progress");
            schedule.duration += layer.latency;
            schedule.layers.push(layer);
        }

        schedule.depth = schedule.layers.len();
        self.check_coherence(allocation, &schedule);
        debug!(
            depth = schedule.depth,
            duration = schedule.duration,
            transfers = schedule.transfers.len(),
            "schedule complete"
        );
        Ok(schedule)
    }

    /// Warn when a qubit's scheduled residency outlasts the coherence
    /// time of its slowest tier.
    fn check_coherence(&self, allocation: &Allocation, schedule: &Schedule) {
        for record in allocation.records.values() {
            let Some(slowest) = record
                .placements
                .iter()
                .map(|p| p.level)
                .max_by_key(|&l| self.hierarchy.access_time(l))
            else {
                continue;
            };
            let Some(level) = self.hierarchy.level(slowest) else {
                continue;
            };
            if schedule.duration > level.coherence_time {
                warn!(
                    qubit = %record.qubit,
                    level = %level.name,
                    duration = schedule.duration,
                    coherence = level.coherence_time,
                    "schedule duration exceeds tier coherence time"
                );
            }
        }
    }
}
