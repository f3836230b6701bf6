//! Cancellation of adjacent inverse gate pairs.

use tracing::debug;

use tierq_ir::{CircuitDag, NodeIndex, StandardGate};

use crate::error::CompileResult;
use crate::pass::Pass;

/// Removes adjacent mutually-inverse single-qubit gate pairs.
///
/// Two gates cancel when they act on the same qubit with no intervening
/// operation and their composition is the identity (`H H`, `S Sdg`,
/// `Rx(t) Rx(-t)`, ...). The pass sweeps until no pair remains.
#[derive(Debug, Default)]
pub struct CancelInversePairs;

impl CancelInversePairs {
    pub fn new() -> Self {
        Self
    }

    /// One sweep over all wires. Returns the node pairs to remove.
    fn find_pairs(dag: &CircuitDag) -> Vec<(NodeIndex, NodeIndex)> {
        let mut pairs = vec![];
        let qubits: Vec<_> = dag.qubits().collect();

        for qubit in qubits {
            let ops = dag.wire_ops(qubit);
            let mut i = 0;
            while i + 1 < ops.len() {
                let (Some(a), Some(b)) = (dag.get_instruction(ops[i]), dag.get_instruction(ops[i + 1]))
                else {
                    i += 1;
                    continue;
                };
                let cancels = match (a.as_gate(), b.as_gate()) {
                    (Some(g1), Some(g2)) => {
                        g1.num_qubits() == 1 && g2.num_qubits() == 1 && g1.is_inverse_of(g2)
                    }
                    _ => false,
                };
                if cancels {
                    pairs.push((ops[i], ops[i + 1]));
                    i += 2;
                } else {
                    i += 1;
                }
            }
        }
        pairs
    }
}

impl Pass for CancelInversePairs {
    fn name(&self) -> &str {
        "cancel-inverse-pairs"
    }

    fn run(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let mut changed = false;
        loop {
            let pairs = Self::find_pairs(dag);
            if pairs.is_empty() {
                break;
            }
            debug!(pairs = pairs.len(), "cancelling inverse single-qubit pairs");
            remove_pairs(dag, pairs)?;
            changed = true;
        }
        Ok(changed)
    }
}

/// Removes adjacent identical self-inverse two-qubit gate pairs.
///
/// `CX CX`, `CZ CZ`, and `Swap Swap` on the same ordered operands compose
/// to the identity. Adjacency requires the second gate to immediately
/// follow the first on both wires.
#[derive(Debug, Default)]
pub struct CancelTwoQubitPairs;

impl CancelTwoQubitPairs {
    pub fn new() -> Self {
        Self
    }

    fn cancellable(gate: &StandardGate) -> bool {
        matches!(gate, StandardGate::CX | StandardGate::CZ | StandardGate::Swap)
    }

    fn find_pairs(dag: &CircuitDag) -> Vec<(NodeIndex, NodeIndex)> {
        let mut pairs = vec![];
        let mut consumed = rustc_hash::FxHashSet::default();

        for (node, inst) in dag.topological_ops() {
            if consumed.contains(&node) {
                continue;
            }
            let Some(gate) = inst.as_gate() else { continue };
            if !Self::cancellable(gate) {
                continue;
            }

            // The candidate must be the immediate successor on both wires.
            let next0 = dag.successor_on_wire(node, inst.qubits[0]);
            let next1 = dag.successor_on_wire(node, inst.qubits[1]);
            let (Some(next), Some(n1)) = (next0, next1) else {
                continue;
            };
            if next != n1 || consumed.contains(&next) {
                continue;
            }

            let Some(other) = dag.get_instruction(next) else {
                continue;
            };
            if other.as_gate() == Some(gate) && other.qubits == inst.qubits {
                consumed.insert(node);
                consumed.insert(next);
                pairs.push((node, next));
            }
        }
        pairs
    }
}

impl Pass for CancelTwoQubitPairs {
    fn name(&self) -> &str {
        "cancel-two-qubit-pairs"
    }

    fn run(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let mut changed = false;
        loop {
            let pairs = Self::find_pairs(dag);
            if pairs.is_empty() {
                break;
            }
            debug!(pairs = pairs.len(), "cancelling two-qubit pairs");
            remove_pairs(dag, pairs)?;
            changed = true;
        }
        Ok(changed)
    }
}

/// Remove matched pairs. Node removal swaps the highest index into the
/// vacated slot, so removal must proceed from the highest index down.
fn remove_pairs(dag: &mut CircuitDag, pairs: Vec<(NodeIndex, NodeIndex)>) -> CompileResult<()> {
    let mut nodes: Vec<NodeIndex> = pairs.into_iter().flat_map(|(a, b)| [a, b]).collect();
    nodes.sort_by(|a, b| b.cmp(a));
    for node in nodes {
        dag.remove_op(node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;
    use tierq_ir::{Circuit, QubitId};

    #[test]
    fn test_hh_cancels() {
        let mut c = Circuit::with_size("t", 1, 0);
        c.h(QubitId(0)).unwrap().h(QubitId(0)).unwrap();
        let mut dag = c.into_dag();

        let changed = CancelInversePairs::new().run(&mut dag).unwrap();
        assert!(changed);
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_cascading_cancellation() {
        // H X X H: inner pair cancels, exposing the outer pair.
        let mut c = Circuit::with_size("t", 1, 0);
        c.h(QubitId(0)).unwrap();
        c.x(QubitId(0)).unwrap();
        c.x(QubitId(0)).unwrap();
        c.h(QubitId(0)).unwrap();
        let mut dag = c.into_dag();

        CancelInversePairs::new().run(&mut dag).unwrap();
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_rotation_pair_cancels() {
        let mut c = Circuit::with_size("t", 1, 0);
        c.rz(PI / 3.0, QubitId(0)).unwrap();
        c.rz(-PI / 3.0, QubitId(0)).unwrap();
        let mut dag = c.into_dag();

        CancelInversePairs::new().run(&mut dag).unwrap();
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_measure_blocks_cancellation() {
        let mut c = Circuit::with_size("t", 1, 1);
        c.h(QubitId(0)).unwrap();
        c.measure(QubitId(0), tierq_ir::ClbitId(0)).unwrap();
        let mut dag = c.into_dag();

        let changed = CancelInversePairs::new().run(&mut dag).unwrap();
        assert!(!changed);
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_cx_pair_cancels() {
        let mut c = Circuit::with_size("t", 2, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        let mut dag = c.into_dag();

        let changed = CancelTwoQubitPairs::new().run(&mut dag).unwrap();
        assert!(changed);
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_cx_reversed_operands_survive() {
        let mut c = Circuit::with_size("t", 2, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cx(QubitId(1), QubitId(0)).unwrap();
        let mut dag = c.into_dag();

        let changed = CancelTwoQubitPairs::new().run(&mut dag).unwrap();
        assert!(!changed);
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_interposed_gate_blocks_cx_cancellation() {
        let mut c = Circuit::with_size("t", 2, 0);
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.z(QubitId(1)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        let mut dag = c.into_dag();

        let changed = CancelTwoQubitPairs::new().run(&mut dag).unwrap();
        assert!(!changed);
        assert_eq!(dag.num_ops(), 3);
    }

    #[test]
    fn test_swap_pair_cancels() {
        let mut c = Circuit::with_size("t", 2, 0);
        c.swap(QubitId(0), QubitId(1)).unwrap();
        c.swap(QubitId(0), QubitId(1)).unwrap();
        let mut dag = c.into_dag();

        CancelTwoQubitPairs::new().run(&mut dag).unwrap();
        assert_eq!(dag.num_ops(), 0);
    }
}
