//! Dead gate elimination.

use tracing::debug;

use tierq_ir::{CircuitDag, NodeIndex};

use crate::error::CompileResult;
use crate::pass::Pass;

/// Removes trailing gates whose output nothing ever reads.
///
/// A gate is dead when it is the last operation on every one of its
/// operand wires: no later gate consumes it and no measurement records
/// it. Removal can expose new trailing gates, so the pass iterates until
/// none remain.
#[derive(Debug, Default)]
pub struct EliminateDeadGates;

impl EliminateDeadGates {
    pub fn new() -> Self {
        Self
    }

    fn find_dead(dag: &CircuitDag) -> Vec<NodeIndex> {
        let mut dead = vec![];
        for (node, inst) in dag.topological_ops() {
            if !inst.is_gate() {
                continue;
            }
            let trailing = inst
                .qubits
                .iter()
                .all(|&q| dag.successor_on_wire(node, q).is_none());
            if trailing {
                dead.push(node);
            }
        }
        dead
    }
}

impl Pass for EliminateDeadGates {
    fn name(&self) -> &str {
        "eliminate-dead-gates"
    }

    fn run(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let mut changed = false;
        loop {
            let mut dead = Self::find_dead(dag);
            if dead.is_empty() {
                break;
            }
            debug!(count = dead.len(), "removing dead trailing gates");
            dead.sort_by(|a, b| b.cmp(a));
            for node in dead {
                dag.remove_op(node)?;
            }
            changed = true;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierq_ir::{Circuit, ClbitId, QubitId};

    #[test]
    fn test_unmeasured_tail_removed() {
        let mut c = Circuit::with_size("t", 1, 0);
        c.h(QubitId(0)).unwrap();
        c.t(QubitId(0)).unwrap();
        let mut dag = c.into_dag();

        let changed = EliminateDeadGates::new().run(&mut dag).unwrap();
        assert!(changed);
        assert_eq!(dag.num_ops(), 0);
    }

    #[test]
    fn test_measured_gates_survive() {
        let mut c = Circuit::with_size("t", 1, 1);
        c.h(QubitId(0)).unwrap();
        c.measure(QubitId(0), ClbitId(0)).unwrap();
        let mut dag = c.into_dag();

        let changed = EliminateDeadGates::new().run(&mut dag).unwrap();
        assert!(!changed);
        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_two_qubit_gate_live_on_one_wire_survives() {
        // The CX feeds q1's measurement even though q0 is never read.
        let mut c = Circuit::with_size("t", 2, 1);
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.measure(QubitId(1), ClbitId(0)).unwrap();
        let mut dag = c.into_dag();

        let changed = EliminateDeadGates::new().run(&mut dag).unwrap();
        assert!(!changed);
        assert_eq!(dag.num_ops(), 3);
    }

    #[test]
    fn test_tail_after_measurement_removed_iteratively() {
        let mut c = Circuit::with_size("t", 2, 1);
        c.h(QubitId(0)).unwrap();
        c.measure(QubitId(0), ClbitId(0)).unwrap();
        c.x(QubitId(1)).unwrap();
        c.z(QubitId(1)).unwrap();
        let mut dag = c.into_dag();

        EliminateDeadGates::new().run(&mut dag).unwrap();
        // q1's whole chain is dead; q0's H feeds the measurement.
        assert_eq!(dag.num_ops(), 2);
    }
}
