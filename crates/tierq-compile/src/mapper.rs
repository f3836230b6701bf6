//! Slot connectivity and swap insertion.
//!
//! Physical slots are addressed by flat ids: hierarchy levels laid out
//! contiguously, so flat id = level offset + slot index. When a two-qubit
//! gate's operands sit in non-adjacent slots, the mapper inserts a chain
//! of Swap gates along a shortest connectivity path to bring them
//! together.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use tierq_ir::{CircuitDag, Instruction, QubitId, StandardGate};
use tierq_mem::{Allocation, MemoryHierarchy};

use crate::error::{CompileError, CompileResult};

/// Adjacency between flat physical slots.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Connectivity {
    num_slots: u32,
    edges: Vec<(u32, u32)>,
    #[serde(skip)]
    adjacency: FxHashMap<u32, Vec<u32>>,
}

impl Connectivity {
    pub fn new(num_slots: u32) -> Self {
        Self {
            num_slots,
            edges: vec![],
            adjacency: FxHashMap::default(),
        }
    }

    /// Add an undirected edge between two slots.
    pub fn add_edge(&mut self, s1: u32, s2: u32) {
        if s1 == s2 || self.is_connected(s1, s2) {
            return;
        }
        self.edges.push((s1, s2));
        self.adjacency.entry(s1).or_default().push(s2);
        self.adjacency.entry(s2).or_default().push(s1);
    }

    /// Rebuild the adjacency list from the edge list. Needed after
    /// deserialization.
    pub fn rebuild_caches(&mut self) {
        self.adjacency.clear();
        let edges = self.edges.clone();
        self.edges.clear();
        for (s1, s2) in edges {
            self.add_edge(s1, s2);
        }
    }

    #[inline]
    pub fn is_connected(&self, s1: u32, s2: u32) -> bool {
        self.adjacency
            .get(&s1)
            .is_some_and(|neighbors| neighbors.contains(&s2))
    }

    #[inline]
    pub fn num_slots(&self) -> u32 {
        self.num_slots
    }

    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    pub fn neighbors(&self, slot: u32) -> impl Iterator<Item = u32> + '_ {
        self.adjacency
            .get(&slot)
            .map(|v| v.iter().copied())
            .into_iter()
            .flatten()
    }

    /// Chain topology 0-1-2-...
    pub fn linear(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n.saturating_sub(1) {
            map.add_edge(i, i + 1);
        }
        map
    }

    /// Every slot connected to every other.
    pub fn full(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                map.add_edge(i, j);
            }
        }
        map
    }

    /// Slot 0 connected to all others.
    pub fn star(n: u32) -> Self {
        let mut map = Self::new(n);
        for i in 1..n {
            map.add_edge(0, i);
        }
        map
    }

    /// BFS shortest path from one slot to another, endpoints included.
    pub fn shortest_path(&self, from: u32, to: u32) -> Option<Vec<u32>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut pred: FxHashMap<u32, u32> = FxHashMap::default();
        let mut queue = VecDeque::new();
        queue.push_back(from);
        pred.insert(from, from);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if pred.contains_key(&neighbor) {
                    continue;
                }
                pred.insert(neighbor, current);
                if neighbor == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while node != from {
                        node = pred[&node];
                        path.push(node);
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }
        None
    }
}

/// Bidirectional logical qubit to flat slot assignment.
#[derive(Debug, Clone, Default)]
pub struct SlotMap {
    logical_to_slot: FxHashMap<QubitId, u32>,
    slot_to_logical: FxHashMap<u32, QubitId>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an allocation: each qubit starts in the flat slot of
    /// its first placement.
    pub fn from_allocation(allocation: &Allocation, hierarchy: &MemoryHierarchy) -> Self {
        let mut map = Self::new();
        for record in allocation.records.values() {
            if let Some(first) = record.placements.first() {
                map.assign(record.qubit, hierarchy.flat_index(first.level, first.slot));
            }
        }
        map
    }

    /// Bind a qubit to a slot, displacing any previous bindings on
    /// either side.
    pub fn assign(&mut self, qubit: QubitId, slot: u32) {
        if let Some(old_slot) = self.logical_to_slot.insert(qubit, slot) {
            self.slot_to_logical.remove(&old_slot);
        }
        if let Some(old_qubit) = self.slot_to_logical.insert(slot, qubit) {
            if old_qubit != qubit {
                self.logical_to_slot.remove(&old_qubit);
            }
        }
    }

    pub fn slot_of(&self, qubit: QubitId) -> Option<u32> {
        self.logical_to_slot.get(&qubit).copied()
    }

    pub fn logical_at(&self, slot: u32) -> Option<QubitId> {
        self.slot_to_logical.get(&slot).copied()
    }

    /// Exchange the occupants of two slots. Either side may be empty.
    pub fn swap(&mut self, s1: u32, s2: u32) {
        let q1 = self.slot_to_logical.remove(&s1);
        let q2 = self.slot_to_logical.remove(&s2);
        if let Some(q) = q2 {
            self.slot_to_logical.insert(s1, q);
            self.logical_to_slot.insert(q, s1);
        }
        if let Some(q) = q1 {
            self.slot_to_logical.insert(s2, q);
            self.logical_to_slot.insert(q, s2);
        }
    }

    pub fn len(&self) -> usize {
        self.logical_to_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical_to_slot.is_empty()
    }
}

/// Inserts swap chains so every two-qubit gate acts on adjacent slots.
#[derive(Debug, Clone)]
pub struct QubitMapper {
    connectivity: Connectivity,
}

impl QubitMapper {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Rebuild the DAG in topological order, inserting a minimal Swap
    /// chain in front of every two-qubit gate whose operand slots are
    /// not adjacent. Returns the routed DAG, the final slot assignment,
    /// and the map from input to output operation steps so the caller
    /// can renumber its allocation.
    pub fn run(
        &self,
        dag: &CircuitDag,
        mut slots: SlotMap,
    ) -> CompileResult<(CircuitDag, SlotMap, Vec<u32>)> {
        let mut routed = CircuitDag::new();
        for qubit in dag.qubits() {
            routed.add_qubit(qubit);
        }
        for clbit in dag.clbits() {
            routed.add_clbit(clbit);
        }
        routed.set_global_phase(dag.global_phase());

        let mut swaps_inserted = 0usize;
        let mut step_map = Vec::with_capacity(dag.num_ops());
        let mut next_step = 0u32;

        for (_, inst) in dag.topological_ops() {
            let is_2q_gate = inst.as_gate().is_some_and(|g| g.num_qubits() == 2);
            if is_2q_gate {
                let (s1, s2) = match (slots.slot_of(inst.qubits[0]), slots.slot_of(inst.qubits[1]))
                {
                    (Some(a), Some(b)) => (a, b),
                    // Unallocated operands route as-is.
                    _ => {
                        routed.push(inst.clone())?;
                        step_map.push(next_step);
                        next_step += 1;
                        continue;
                    }
                };

                if !self.connectivity.is_connected(s1, s2) {
                    let path = self
                        .connectivity
                        .shortest_path(s1, s2)
                        .ok_or(CompileError::Mapping { from: s1, to: s2 })?;
                    // Walk the first operand up to the slot next to the
                    // second; the last hop is covered by the gate itself.
                    for window in path.windows(2).take(path.len().saturating_sub(2)) {
                        let (a, b) = (window[0], window[1]);
                        if let (Some(qa), Some(qb)) = (slots.logical_at(a), slots.logical_at(b)) {
                            routed.push(Instruction::two_qubit_gate(StandardGate::Swap, qa, qb))?;
                            swaps_inserted += 1;
                            next_step += 1;
                        }
                        slots.swap(a, b);
                    }
                }
            }
            routed.push(inst.clone())?;
            step_map.push(next_step);
            next_step += 1;
        }

        if swaps_inserted > 0 {
            debug!(swaps = swaps_inserted, "inserted routing swaps");
        }
        Ok((routed, slots, step_map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierq_ir::Circuit;

    fn slot_map(pairs: &[(u32, u32)]) -> SlotMap {
        let mut map = SlotMap::new();
        for &(q, s) in pairs {
            map.assign(QubitId(q), s);
        }
        map
    }

    #[test]
    fn test_linear_path() {
        let c = Connectivity::linear(4);
        assert_eq!(c.shortest_path(0, 3), Some(vec![0, 1, 2, 3]));
        assert!(c.is_connected(1, 2));
        assert!(!c.is_connected(0, 2));
    }

    #[test]
    fn test_star_paths_go_through_center() {
        let c = Connectivity::star(4);
        assert_eq!(c.shortest_path(1, 3), Some(vec![1, 0, 3]));
    }

    #[test]
    fn test_disconnected_slots_have_no_path() {
        let mut c = Connectivity::new(4);
        c.add_edge(0, 1);
        c.add_edge(2, 3);
        assert_eq!(c.shortest_path(0, 3), None);
    }

    #[test]
    fn test_slot_map_swap() {
        let mut map = slot_map(&[(0, 0), (1, 1)]);
        map.swap(0, 1);
        assert_eq!(map.slot_of(QubitId(0)), Some(1));
        assert_eq!(map.slot_of(QubitId(1)), Some(0));
    }

    #[test]
    fn test_slot_map_swap_with_empty_slot() {
        let mut map = slot_map(&[(0, 0)]);
        map.swap(0, 2);
        assert_eq!(map.slot_of(QubitId(0)), Some(2));
        assert_eq!(map.logical_at(0), None);
    }

    #[test]
    fn test_adjacent_gate_needs_no_swaps() {
        let mut c = Circuit::with_size("t", 2, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        let dag = c.into_dag();

        let mapper = QubitMapper::new(Connectivity::linear(2));
        let (routed, _, steps) = mapper.run(&dag, slot_map(&[(0, 0), (1, 1)])).unwrap();
        assert_eq!(routed.num_ops(), 1);
        assert_eq!(steps, vec![0]);
    }

    #[test]
    fn test_distant_gate_gets_swap_chain() {
        let mut c = Circuit::with_size("t", 3, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let dag = c.into_dag();

        let mapper = QubitMapper::new(Connectivity::linear(3));
        let (routed, slots, steps) = mapper
            .run(&dag, slot_map(&[(0, 0), (1, 1), (2, 2)]))
            .unwrap();

        let names: Vec<_> = routed.topological_ops().map(|(_, i)| i.name()).collect();
        assert_eq!(names, vec!["swap", "cx"]);
        // q0 moved to slot 1, q1 displaced to slot 0.
        assert_eq!(slots.slot_of(QubitId(0)), Some(1));
        assert_eq!(slots.slot_of(QubitId(1)), Some(0));
        assert_eq!(slots.slot_of(QubitId(2)), Some(2));
        // The cx slid from step 0 to step 1 behind the swap.
        assert_eq!(steps, vec![1]);
    }

    #[test]
    fn test_disconnected_gate_fails() {
        let mut c = Circuit::with_size("t", 2, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        let dag = c.into_dag();

        let mut connectivity = Connectivity::new(4);
        connectivity.add_edge(0, 2);
        let mapper = QubitMapper::new(connectivity);
        let err = mapper.run(&dag, slot_map(&[(0, 0), (1, 1)])).unwrap_err();
        assert!(matches!(err, CompileError::Mapping { from: 0, to: 1 }));
    }

    #[test]
    fn test_swap_through_empty_slot_emits_no_gate() {
        // Slot 1 is empty; q0 moves through it silently.
        let mut c = Circuit::with_size("t", 3, 0);
        c.cx(QubitId(0), QubitId(2)).unwrap();
        let dag = c.into_dag();

        let mapper = QubitMapper::new(Connectivity::linear(4));
        let (routed, slots, _) = mapper.run(&dag, slot_map(&[(0, 0), (2, 2)])).unwrap();

        let names: Vec<_> = routed.topological_ops().map(|(_, i)| i.name()).collect();
        assert_eq!(names, vec!["cx"]);
        assert_eq!(slots.slot_of(QubitId(0)), Some(1));
    }

    #[test]
    fn test_measurements_pass_through() {
        let mut c = Circuit::with_size("t", 2, 2);
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.measure_all().unwrap();
        let dag = c.into_dag();

        let mapper = QubitMapper::new(Connectivity::linear(2));
        let (routed, _, steps) = mapper.run(&dag, slot_map(&[(0, 0), (1, 1)])).unwrap();
        assert_eq!(routed.num_ops(), 4);
        assert_eq!(steps, vec![0, 1, 2, 3]);
        assert!(routed.is_measured(QubitId(0)));
    }
}
