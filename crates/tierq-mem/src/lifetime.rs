//! Qubit lifetime analysis.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tierq_ir::{CircuitDag, QubitId};

/// The span of operation steps over which a qubit is live.
///
/// Steps index the circuit's topological operation order; a qubit is live
/// from its first operation through its last (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    /// Step of the qubit's first operation.
    pub first_use: u32,
    /// Step of the qubit's last operation.
    pub last_use: u32,
}

impl Lifetime {
    /// Number of steps the qubit is live.
    pub fn len(&self) -> u32 {
        self.last_use - self.first_use + 1
    }

    /// A lifetime always covers at least one step.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether two lifetimes share any step.
    pub fn overlaps(&self, other: &Lifetime) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

/// Per-qubit liveness computed in one forward pass over the circuit.
#[derive(Debug, Clone, Default)]
pub struct LifetimeTable {
    lifetimes: FxHashMap<QubitId, Lifetime>,
    usage: FxHashMap<QubitId, u32>,
    steps: FxHashMap<QubitId, Vec<u32>>,
    declared: FxHashSet<QubitId>,
    num_steps: u32,
}

impl LifetimeTable {
    /// Analyze a circuit DAG.
    ///
    /// Every operation touching a qubit (gates, measurements, resets) counts
    /// as a use. Qubits declared in the circuit but never operated on report
    /// a nominal `[0, 0]` lifetime with zero usage and consume no slot.
    #[allow(clippy::cast_possible_truncation)]
    pub fn analyze(dag: &CircuitDag) -> Self {
        let mut table = Self {
            declared: dag.qubits().collect(),
            ..Self::default()
        };

        for (step, (_node, inst)) in dag.topological_ops().enumerate() {
            let step = step as u32;
            for &qubit in &inst.qubits {
                table
                    .lifetimes
                    .entry(qubit)
                    .and_modify(|lt| lt.last_use = step)
                    .or_insert(Lifetime {
                        first_use: step,
                        last_use: step,
                    });
                *table.usage.entry(qubit).or_insert(0) += 1;
                table.steps.entry(qubit).or_default().push(step);
            }
            table.num_steps = step + 1;
        }

        table
    }

    /// Lifetime of a declared qubit. Never-used qubits report `[0, 0]`;
    /// undeclared qubits report nothing.
    pub fn lifetime(&self, qubit: QubitId) -> Option<Lifetime> {
        if let Some(lt) = self.lifetimes.get(&qubit) {
            return Some(*lt);
        }
        self.declared.contains(&qubit).then_some(Lifetime {
            first_use: 0,
            last_use: 0,
        })
    }

    /// Number of operations touching a qubit.
    pub fn usage(&self, qubit: QubitId) -> u32 {
        self.usage.get(&qubit).copied().unwrap_or(0)
    }

    /// The ordered operation steps at which a qubit is used.
    pub fn use_steps(&self, qubit: QubitId) -> &[u32] {
        self.steps.get(&qubit).map_or(&[], Vec::as_slice)
    }

    /// Qubits with at least one use, in id order.
    pub fn live_qubits(&self) -> Vec<QubitId> {
        let mut qubits: Vec<_> = self.lifetimes.keys().copied().collect();
        qubits.sort_unstable();
        qubits
    }

    /// Number of used qubits.
    pub fn len(&self) -> usize {
        self.lifetimes.len()
    }

    /// Whether no qubit is ever used.
    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
    }

    /// Total number of operation steps in the analyzed circuit.
    pub fn num_steps(&self) -> u32 {
        self.num_steps
    }

    /// Maximum number of simultaneously live qubits, via a sweep over
    /// lifetime start and end events.
    pub fn peak_concurrency(&self) -> usize {
        let mut events: Vec<(u32, i32)> = Vec::with_capacity(self.lifetimes.len() * 2);
        for lt in self.lifetimes.values() {
            events.push((lt.first_use, 1));
            events.push((lt.last_use + 1, -1));
        }
        // Ends sort before starts at the same step so that a qubit dying at
        // step s and one born at s + 1 never double-count.
        events.sort_unstable_by_key(|&(step, delta)| (step, delta));

        let mut live = 0i32;
        let mut peak = 0i32;
        for (_, delta) in events {
            live += delta;
            peak = peak.max(live);
        }
        peak as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierq_ir::{Circuit, ClbitId, QubitId};

    #[test]
    fn test_lifetime_overlap() {
        let a = Lifetime {
            first_use: 0,
            last_use: 3,
        };
        let b = Lifetime {
            first_use: 3,
            last_use: 5,
        };
        let c = Lifetime {
            first_use: 4,
            last_use: 6,
        };
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.len(), 4);
    }

    #[test]
    fn test_analyze_bell() {
        let circuit = Circuit::bell().unwrap();
        let table = LifetimeTable::analyze(circuit.dag());

        assert_eq!(table.len(), 2);
        // q0: H at step 0, CX at step 1, measure later.
        let lt0 = table.lifetime(QubitId(0)).unwrap();
        assert_eq!(lt0.first_use, 0);
        assert_eq!(table.usage(QubitId(0)), 3);
        assert_eq!(table.peak_concurrency(), 2);
    }

    #[test]
    fn test_disjoint_lifetimes_peak_of_one() {
        // q0 finishes (measured) before q1 starts.
        let mut circuit = Circuit::with_size("seq", 2, 2);
        circuit.h(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.h(QubitId(1)).unwrap();
        circuit.measure(QubitId(1), ClbitId(1)).unwrap();

        let table = LifetimeTable::analyze(circuit.dag());
        assert_eq!(table.len(), 2);
        assert_eq!(table.peak_concurrency(), 1);
    }

    #[test]
    fn test_unused_qubit_gets_nominal_lifetime_but_no_slot() {
        let mut circuit = Circuit::with_size("sparse", 3, 0);
        circuit.h(QubitId(1)).unwrap();

        let table = LifetimeTable::analyze(circuit.dag());
        assert_eq!(table.len(), 1);
        let unused = table.lifetime(QubitId(0)).unwrap();
        assert_eq!((unused.first_use, unused.last_use), (0, 0));
        assert_eq!(table.usage(QubitId(0)), 0);
        assert_eq!(table.live_qubits(), vec![QubitId(1)]);
        assert!(table.lifetime(QubitId(7)).is_none());
    }

    #[test]
    fn test_concurrent_ops_step_in_insertion_order() {
        // Independent wires: the gates could run in any order, but the
        // step numbers must follow the instruction sequence.
        let mut circuit = Circuit::with_size("par", 3, 0);
        circuit.h(QubitId(2)).unwrap();
        circuit.h(QubitId(0)).unwrap();
        circuit.h(QubitId(1)).unwrap();

        let table = LifetimeTable::analyze(circuit.dag());
        assert_eq!(table.use_steps(QubitId(2)), &[0]);
        assert_eq!(table.use_steps(QubitId(0)), &[1]);
        assert_eq!(table.use_steps(QubitId(1)), &[2]);
    }

    #[test]
    fn test_use_steps_recorded() {
        let mut circuit = Circuit::with_size("steps", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.t(QubitId(0)).unwrap();

        let table = LifetimeTable::analyze(circuit.dag());
        assert_eq!(table.use_steps(QubitId(0)), &[0, 1, 2]);
        assert_eq!(table.use_steps(QubitId(1)), &[1]);
        assert_eq!(table.num_steps(), 3);
    }
}
