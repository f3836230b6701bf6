//! DAG-based circuit representation.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node containing an instruction.
    Op(Instruction),
}

impl DagNode {
    /// Check if this is an operation node.
    #[inline]
    pub fn is_op(&self) -> bool {
        matches!(self, DagNode::Op(_))
    }

    /// Get the instruction if this is an operation node.
    #[inline]
    pub fn instruction(&self) -> Option<&Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }

    /// Get mutable reference to the instruction.
    #[inline]
    pub fn instruction_mut(&mut self) -> Option<&mut Instruction> {
        match self {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

impl From<QubitId> for WireId {
    fn from(q: QubitId) -> Self {
        WireId::Qubit(q)
    }
}

impl From<ClbitId> for WireId {
    fn from(c: ClbitId) -> Self {
        WireId::Clbit(c)
    }
}

/// An edge in the circuit DAG representing a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DagEdge {
    /// The wire this edge represents.
    pub wire: WireId,
}

/// DAG-based circuit representation.
///
/// The circuit is represented as a directed acyclic graph where:
/// - Nodes are either input nodes, output nodes, or operation nodes
/// - Edges represent wires (quantum or classical)
/// - Each wire has exactly one input and one output node
/// - Operations are connected to wires in topological order
///
/// The DAG maintains a `wire_front` index that maps each wire to the last
/// node before the output node, so `push()` needs no edge scan to find the
/// append point.
///
/// Measurement consumes a qubit's quantum state: pushing a gate onto a wire
/// whose qubit has been measured is rejected until a `Reset` re-initializes
/// it. This is what lets a retired slot be handed to a fresh qubit.
#[derive(Debug)]
pub struct CircuitDag {
    /// The underlying graph.
    graph: DiGraph<DagNode, DagEdge, u32>,
    /// Map from qubit to its input node.
    qubit_inputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from qubit to its output node.
    qubit_outputs: FxHashMap<QubitId, NodeIndex>,
    /// Map from classical bit to its input node.
    clbit_inputs: FxHashMap<ClbitId, NodeIndex>,
    /// Map from classical bit to its output node.
    clbit_outputs: FxHashMap<ClbitId, NodeIndex>,
    /// Wire front: maps each wire to the node just before the output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Operation nodes in program (insertion) order. Appending only ever
    /// depends on earlier ops, so this is a valid topological order, and
    /// unlike a graph traversal it is stable for concurrent ops.
    op_order: Vec<NodeIndex>,
    /// Qubits whose last quantum operation was a measurement.
    measured: FxHashSet<QubitId>,
    /// Global phase of the circuit.
    global_phase: f64,
}

impl CircuitDag {
    /// Create a new empty circuit DAG.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::default(),
            qubit_inputs: FxHashMap::default(),
            qubit_outputs: FxHashMap::default(),
            clbit_inputs: FxHashMap::default(),
            clbit_outputs: FxHashMap::default(),
            wire_front: FxHashMap::default(),
            op_order: Vec::new(),
            measured: FxHashSet::default(),
            global_phase: 0.0,
        }
    }

    /// Add a qubit to the circuit.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        if self.qubit_inputs.contains_key(&qubit) {
            return;
        }
        let wire = WireId::Qubit(qubit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.qubit_inputs.insert(qubit, in_node);
        self.qubit_outputs.insert(qubit, out_node);
        self.wire_front.insert(wire, in_node);
    }

    /// Add a classical bit to the circuit.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if self.clbit_inputs.contains_key(&clbit) {
            return;
        }
        let wire = WireId::Clbit(clbit);
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, DagEdge { wire });
        self.clbit_inputs.insert(clbit, in_node);
        self.clbit_outputs.insert(clbit, out_node);
        self.wire_front.insert(wire, in_node);
    }

    /// Append an instruction to the circuit.
    #[allow(clippy::needless_pass_by_value, clippy::cast_possible_truncation)]
    pub fn push(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let op_name = match &instruction.kind {
            InstructionKind::Gate(gate) => Some(gate.name().to_string()),
            _ => None,
        };

        // Validate gate arity matches qubit count
        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits() as usize;
            let got = instruction.qubits.len();
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: expected as u32,
                    got: got as u32,
                });
            }
        }

        // Validate qubits exist
        for &qubit in &instruction.qubits {
            if !self.qubit_inputs.contains_key(&qubit) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    op_name: op_name.clone(),
                });
            }
        }

        // Validate classical bits exist
        for &clbit in &instruction.clbits {
            if !self.clbit_inputs.contains_key(&clbit) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    op_name: op_name.clone(),
                });
            }
        }

        // Check for duplicate qubits in the instruction
        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    op_name: op_name.clone(),
                });
            }
        }

        // A measured wire accepts no further gates until reset.
        if let InstructionKind::Gate(gate) = &instruction.kind {
            for &qubit in &instruction.qubits {
                if self.measured.contains(&qubit) {
                    return Err(IrError::GateAfterMeasurement {
                        qubit,
                        gate_name: gate.name().to_string(),
                    });
                }
            }
        }

        match &instruction.kind {
            InstructionKind::Measure => {
                for &qubit in &instruction.qubits {
                    self.measured.insert(qubit);
                }
            }
            InstructionKind::Reset => {
                for &qubit in &instruction.qubits {
                    self.measured.remove(&qubit);
                }
            }
            _ => {}
        }

        // Add the operation node
        let op_node = self.graph.add_node(DagNode::Op(instruction.clone()));
        self.op_order.push(op_node);

        // Connect quantum wires via the wire_front index.
        for &qubit in &instruction.qubits {
            let out_node = self.qubit_outputs[&qubit];
            let wire = WireId::Qubit(qubit);
            self.splice_before_output(wire, op_node, out_node)?;
        }

        // Connect classical wires the same way.
        for &clbit in &instruction.clbits {
            let out_node = self.clbit_outputs[&clbit];
            let wire = WireId::Clbit(clbit);
            self.splice_before_output(wire, op_node, out_node)?;
        }

        Ok(op_node)
    }

    /// Splice `op_node` between the current wire front and the output node.
    fn splice_before_output(
        &mut self,
        wire: WireId,
        op_node: NodeIndex,
        out_node: NodeIndex,
    ) -> IrResult<()> {
        let prev_node = self.wire_front[&wire];

        let edge_id = self
            .graph
            .edges_directed(prev_node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire && e.target() == out_node)
            .map(|e| e.id());

        let eid = edge_id.ok_or_else(|| {
            IrError::InvalidDag(format!(
                "Missing edge from predecessor to output for wire {wire:?}"
            ))
        })?;
        self.graph.remove_edge(eid);
        self.graph.add_edge(prev_node, op_node, DagEdge { wire });
        self.graph.add_edge(op_node, out_node, DagEdge { wire });
        self.wire_front.insert(wire, op_node);
        Ok(())
    }

    /// Iterate over operations in program order.
    ///
    /// This is the circuit's instruction sequence, which is always a valid
    /// topological order of the DAG. Liveness analysis and scheduling both
    /// index steps into this sequence, so it must be deterministic;
    /// concurrent operations keep their relative insertion order rather
    /// than whatever a graph traversal happens to visit first.
    pub fn topological_ops(&self) -> impl Iterator<Item = (NodeIndex, &Instruction)> {
        self.op_order.iter().map(|&idx| {
            let inst = self.graph[idx]
                .instruction()
                .expect("op_order entries are operation nodes");
            (idx, inst)
        })
    }

    /// Get an instruction by node index.
    #[inline]
    pub fn get_instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        self.graph.node_weight(node).and_then(|n| n.instruction())
    }

    /// Get a mutable instruction by node index.
    #[inline]
    pub fn get_instruction_mut(&mut self, node: NodeIndex) -> Option<&mut Instruction> {
        self.graph
            .node_weight_mut(node)
            .and_then(|n| n.instruction_mut())
    }

    /// Remove an operation node from the DAG.
    ///
    /// WARNING: petgraph's `remove_node` swaps the removed node with the last
    /// node in the graph, invalidating the last node's `NodeIndex`. Callers
    /// must not hold stale `NodeIndex` references after calling `remove_op`.
    /// When removing multiple nodes, remove in reverse collection order or
    /// re-fetch indices after each removal.
    pub fn remove_op(&mut self, node: NodeIndex) -> IrResult<Instruction> {
        let dag_node = self
            .graph
            .node_weight(node)
            .ok_or(IrError::InvalidNode)?
            .clone();

        let DagNode::Op(instruction) = dag_node else {
            return Err(IrError::InvalidDag(
                "Cannot remove non-operation node".into(),
            ));
        };

        // For each wire through this node, reconnect predecessors to successors
        let incoming: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|e| (e.source(), e.weight().wire))
            .collect();

        let outgoing: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .map(|e| (e.target(), e.weight().wire))
            .collect();

        let last_idx = NodeIndex::new(self.graph.node_count() - 1);

        // Update wire_front for wires passing through the removed node.
        for (pred, wire) in &incoming {
            if self.wire_front.get(wire) == Some(&node) {
                self.wire_front.insert(*wire, *pred);
            }
        }

        // Removing a measurement re-opens the wire for gates.
        if instruction.is_measure() {
            for &qubit in &instruction.qubits {
                self.measured.remove(&qubit);
            }
        }

        self.graph.remove_node(node);

        if let Some(pos) = self.op_order.iter().position(|&n| n == node) {
            self.op_order.remove(pos);
        }

        // Remap indices affected by petgraph's swap-remove.
        let fix = |idx: NodeIndex| -> NodeIndex {
            if last_idx != node && idx == last_idx {
                node
            } else {
                idx
            }
        };

        if last_idx != node {
            for v in self.qubit_inputs.values_mut() {
                if *v == last_idx {
                    *v = node;
                }
            }
            for v in self.qubit_outputs.values_mut() {
                if *v == last_idx {
                    *v = node;
                }
            }
            for v in self.clbit_inputs.values_mut() {
                if *v == last_idx {
                    *v = node;
                }
            }
            for v in self.clbit_outputs.values_mut() {
                if *v == last_idx {
                    *v = node;
                }
            }
            for v in self.wire_front.values_mut() {
                if *v == last_idx {
                    *v = node;
                }
            }
            for v in &mut self.op_order {
                if *v == last_idx {
                    *v = node;
                }
            }
        }

        // Reconnect wires: add edges from predecessor to successor per wire.
        for (pred, wire) in &incoming {
            let pred = fix(*pred);
            for (succ, succ_wire) in &outgoing {
                let succ = fix(*succ);
                if wire == succ_wire {
                    self.graph.add_edge(pred, succ, DagEdge { wire: *wire });
                }
            }
        }

        Ok(instruction)
    }

    /// Operation nodes on a qubit's wire, in wire order.
    pub fn wire_ops(&self, qubit: QubitId) -> Vec<NodeIndex> {
        let wire = WireId::Qubit(qubit);
        let Some(&in_node) = self.qubit_inputs.get(&qubit) else {
            return vec![];
        };
        let out_node = self.qubit_outputs[&qubit];

        let mut ops = vec![];
        let mut current = in_node;
        while current != out_node {
            let next = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target());
            match next {
                Some(n) => {
                    if self.graph[n].is_op() {
                        ops.push(n);
                    }
                    current = n;
                }
                None => break,
            }
        }
        ops
    }

    /// The next operation node after `node` on the given qubit's wire, if any.
    pub fn successor_on_wire(&self, node: NodeIndex, qubit: QubitId) -> Option<NodeIndex> {
        let wire = WireId::Qubit(qubit);
        let next = self
            .graph
            .edges_directed(node, Direction::Outgoing)
            .find(|e| e.weight().wire == wire)
            .map(|e| e.target())?;
        if self.graph[next].is_op() { Some(next) } else { None }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.qubit_inputs.len()
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> usize {
        self.clbit_inputs.len()
    }

    /// Get the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        let io_nodes = 2 * (self.qubit_inputs.len() + self.clbit_inputs.len());
        self.graph.node_count().saturating_sub(io_nodes)
    }

    /// Number of gate operations (excludes measure and reset).
    pub fn gate_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|n| matches!(n, DagNode::Op(inst) if inst.is_gate()))
            .count()
    }

    /// Calculate the circuit depth.
    pub fn depth(&self) -> usize {
        let node_count = self.graph.node_count();
        let mut depths: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(node_count, Default::default());

        let mut max_depth = 0usize;

        for node in petgraph::algo::toposort(&self.graph, None)
            .expect("wire edges cannot form a cycle")
        {
            let max_pred_depth = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| depths.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);

            let node_depth = if matches!(self.graph[node], DagNode::Op(_)) {
                max_pred_depth + 1
            } else {
                max_pred_depth
            };

            if node_depth > max_depth {
                max_depth = node_depth;
            }
            depths.insert(node, node_depth);
        }

        max_depth
    }

    /// Iterate over qubits.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.qubit_inputs.keys().copied()
    }

    /// Iterate over classical bits.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        self.clbit_inputs.keys().copied()
    }

    /// Check whether a qubit's wire currently ends in a measurement.
    pub fn is_measured(&self, qubit: QubitId) -> bool {
        self.measured.contains(&qubit)
    }

    /// Get the global phase.
    pub fn global_phase(&self) -> f64 {
        self.global_phase
    }

    /// Set the global phase.
    pub fn set_global_phase(&mut self, phase: f64) {
        self.global_phase = phase;
    }

    /// Get a reference to the underlying graph.
    pub fn graph(&self) -> &DiGraph<DagNode, DagEdge, u32> {
        &self.graph
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - The graph is acyclic
    /// - Every qubit and classical bit has matching In and Out nodes
    /// - Wire edges form unbroken paths from In to Out for each wire
    /// - All nodes are reachable
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        for &qubit in self.qubit_inputs.keys() {
            if !self.qubit_outputs.contains_key(&qubit) {
                return Err(IrError::InvalidDag(format!(
                    "Qubit {qubit:?} has an In node but no Out node"
                )));
            }
        }
        for &clbit in self.clbit_inputs.keys() {
            if !self.clbit_outputs.contains_key(&clbit) {
                return Err(IrError::InvalidDag(format!(
                    "Clbit {clbit:?} has an In node but no Out node"
                )));
            }
        }

        for (&qubit, &in_node) in &self.qubit_inputs {
            self.verify_wire(WireId::Qubit(qubit), in_node, self.qubit_outputs[&qubit])?;
        }
        for (&clbit, &in_node) in &self.clbit_inputs {
            self.verify_wire(WireId::Clbit(clbit), in_node, self.clbit_outputs[&clbit])?;
        }

        // A toposort over an acyclic graph visits every node; a shortfall
        // means something is dangling.
        let topo_nodes = petgraph::algo::toposort(&self.graph, None).unwrap_or_default();
        if topo_nodes.len() != self.graph.node_count() {
            return Err(IrError::InvalidDag(
                "Unreachable operation node found in DAG".into(),
            ));
        }

        if self.op_order.len() != self.num_ops() {
            return Err(IrError::InvalidDag(
                "Program order is out of sync with the graph".into(),
            ));
        }
        for &idx in &self.op_order {
            if !self.graph.node_weight(idx).is_some_and(DagNode::is_op) {
                return Err(IrError::InvalidDag(
                    "Program order references a non-operation node".into(),
                ));
            }
        }

        Ok(())
    }

    /// Walk one wire from In to Out, checking continuity.
    fn verify_wire(&self, wire: WireId, in_node: NodeIndex, out_node: NodeIndex) -> IrResult<()> {
        let mut current = in_node;
        let mut steps = 0;
        let max_steps = self.graph.node_count();

        loop {
            if current == out_node {
                return Ok(());
            }

            let next = self
                .graph
                .edges_directed(current, Direction::Outgoing)
                .find(|e| e.weight().wire == wire)
                .map(|e| e.target());

            match next {
                Some(n) => current = n,
                None => {
                    return Err(IrError::InvalidDag(format!(
                        "Wire {wire:?} is broken: no outgoing edge from node {current:?}"
                    )));
                }
            }

            steps += 1;
            if steps > max_steps {
                return Err(IrError::InvalidDag(format!(
                    "Wire {wire:?} has too many steps (possible infinite loop)"
                )));
            }
        }
    }
}

impl Default for CircuitDag {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CircuitDag {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            qubit_inputs: self.qubit_inputs.clone(),
            qubit_outputs: self.qubit_outputs.clone(),
            clbit_inputs: self.clbit_inputs.clone(),
            clbit_outputs: self.clbit_outputs.clone(),
            wire_front: self.wire_front.clone(),
            op_order: self.op_order.clone(),
            measured: self.measured.clone(),
            global_phase: self.global_phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::StandardGate;

    #[test]
    fn test_empty_dag() {
        let dag = CircuitDag::new();
        assert_eq!(dag.num_qubits(), 0);
        assert_eq!(dag.num_ops(), 0);
        assert_eq!(dag.depth(), 0);
    }

    #[test]
    fn test_push_gate() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();

        assert_eq!(dag.num_ops(), 1);
        assert_eq!(dag.depth(), 1);
    }

    #[test]
    fn test_bell_depth() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::two_qubit_gate(
            StandardGate::CX,
            QubitId(0),
            QubitId(1),
        ))
        .unwrap();

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 2);
    }

    #[test]
    fn test_parallel_gates_depth() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(1)))
            .unwrap();

        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 1);
    }

    #[test]
    fn test_parallel_gates_keep_program_order() {
        // Ops on independent wires have no dependency edge; the iteration
        // order must still be the insertion order, not traversal order.
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.add_qubit(QubitId(2));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(2)))
            .unwrap();
        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(1)))
            .unwrap();

        let qubits: Vec<_> = dag
            .topological_ops()
            .map(|(_, inst)| inst.qubits[0])
            .collect();
        assert_eq!(qubits, vec![QubitId(2), QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_program_order_survives_removal() {
        // remove_op swap-removes the last graph node; the remaining ops
        // must keep their relative order under the remapped indices.
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let t = dag
            .push(Instruction::single_qubit_gate(StandardGate::T, QubitId(1)))
            .unwrap();
        dag.push(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
            .unwrap();
        dag.push(Instruction::single_qubit_gate(StandardGate::S, QubitId(1)))
            .unwrap();

        dag.remove_op(t).unwrap();
        let names: Vec<_> = dag.topological_ops().map(|(_, i)| i.name()).collect();
        assert_eq!(names, vec!["h", "x", "s"]);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_gate_arity_mismatch() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        let inst = Instruction::gate(StandardGate::CX, [QubitId(0)]);
        let result = dag.push(inst);

        match result {
            Err(IrError::QubitCountMismatch {
                gate_name,
                expected,
                got,
            }) => {
                assert_eq!(gate_name, "cx");
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            _ => panic!("Expected QubitCountMismatch error"),
        }
    }

    #[test]
    fn test_gate_after_measurement_rejected() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_clbit(ClbitId(0));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();

        let result = dag.push(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)));
        assert!(matches!(
            result,
            Err(IrError::GateAfterMeasurement { qubit, .. }) if qubit == QubitId(0)
        ));
    }

    #[test]
    fn test_reset_reopens_measured_wire() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_clbit(ClbitId(0));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        assert!(dag.is_measured(QubitId(0)));

        dag.push(Instruction::reset(QubitId(0))).unwrap();
        assert!(!dag.is_measured(QubitId(0)));

        dag.push(Instruction::single_qubit_gate(StandardGate::X, QubitId(0)))
            .unwrap();
        assert_eq!(dag.num_ops(), 4);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_wire_ops_order() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));

        let a = dag
            .push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let b = dag
            .push(Instruction::two_qubit_gate(
                StandardGate::CX,
                QubitId(0),
                QubitId(1),
            ))
            .unwrap();
        let c = dag
            .push(Instruction::single_qubit_gate(StandardGate::T, QubitId(0)))
            .unwrap();

        assert_eq!(dag.wire_ops(QubitId(0)), vec![a, b, c]);
        assert_eq!(dag.wire_ops(QubitId(1)), vec![b]);
        assert_eq!(dag.successor_on_wire(a, QubitId(0)), Some(b));
        assert_eq!(dag.successor_on_wire(c, QubitId(0)), None);
    }

    #[test]
    fn test_remove_op_reconnects() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        let t = dag
            .push(Instruction::single_qubit_gate(StandardGate::T, QubitId(0)))
            .unwrap();
        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();

        dag.remove_op(t).unwrap();
        assert_eq!(dag.num_ops(), 2);
        assert_eq!(dag.depth(), 2);
        dag.verify_integrity().unwrap();
    }

    #[test]
    fn test_gate_count_excludes_non_gates() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_clbit(ClbitId(0));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        dag.push(Instruction::reset(QubitId(0))).unwrap();

        assert_eq!(dag.num_ops(), 3);
        assert_eq!(dag.gate_count(), 1);
    }

    #[test]
    fn test_verify_integrity_full_circuit() {
        let mut dag = CircuitDag::new();
        dag.add_qubit(QubitId(0));
        dag.add_qubit(QubitId(1));
        dag.add_qubit(QubitId(2));
        dag.add_clbit(ClbitId(0));
        dag.add_clbit(ClbitId(1));
        dag.add_clbit(ClbitId(2));

        dag.push(Instruction::single_qubit_gate(StandardGate::H, QubitId(0)))
            .unwrap();
        dag.push(Instruction::two_qubit_gate(
            StandardGate::CX,
            QubitId(0),
            QubitId(1),
        ))
        .unwrap();
        dag.push(Instruction::two_qubit_gate(
            StandardGate::CX,
            QubitId(1),
            QubitId(2),
        ))
        .unwrap();
        dag.push(Instruction::measure(QubitId(0), ClbitId(0)))
            .unwrap();
        dag.push(Instruction::measure(QubitId(1), ClbitId(1)))
            .unwrap();
        dag.push(Instruction::measure(QubitId(2), ClbitId(2)))
            .unwrap();

        dag.verify_integrity().unwrap();
    }
}
