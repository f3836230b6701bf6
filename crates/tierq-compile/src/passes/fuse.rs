//! Fusion of single-qubit gate runs.

use tracing::debug;

use tierq_ir::{CircuitDag, InstructionKind, NodeIndex, StandardGate};

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::unitary::Unitary2x2;

/// Composes maximal runs of consecutive single-qubit gates on a wire into
/// a single `U(theta, phi, lambda)` gate via ZYZ decomposition.
///
/// Runs that compose to the identity are deleted outright, with their
/// phase folded into the DAG's global phase. Runs shorter than two gates
/// are left alone.
#[derive(Debug, Default)]
pub struct FuseSingleQubitRuns;

impl FuseSingleQubitRuns {
    pub fn new() -> Self {
        Self
    }

    /// Maximal runs of >= 2 consecutive single-qubit gates per wire.
    fn find_runs(dag: &CircuitDag) -> Vec<Vec<NodeIndex>> {
        let mut runs = vec![];
        let qubits: Vec<_> = dag.qubits().collect();

        for qubit in qubits {
            let mut current: Vec<NodeIndex> = vec![];
            for node in dag.wire_ops(qubit) {
                let is_1q_gate = dag
                    .get_instruction(node)
                    .and_then(|inst| inst.as_gate())
                    .is_some_and(|g| g.num_qubits() == 1);
                if is_1q_gate {
                    current.push(node);
                } else {
                    if current.len() >= 2 {
                        runs.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
            }
            if current.len() >= 2 {
                runs.push(current);
            }
        }
        runs
    }

    /// Compose the run into one matrix. Gates apply left to right, so the
    /// product is built right-multiplying each successive gate.
    fn compose(dag: &CircuitDag, run: &[NodeIndex]) -> Option<Unitary2x2> {
        let mut total = Unitary2x2::identity();
        for &node in run {
            let gate = dag.get_instruction(node)?.as_gate()?;
            total = Unitary2x2::from_gate(gate)? * total;
        }
        Some(total)
    }
}

impl Pass for FuseSingleQubitRuns {
    fn name(&self) -> &str {
        "fuse-single-qubit-runs"
    }

    fn run(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let runs = Self::find_runs(dag);
        if runs.is_empty() {
            return Ok(false);
        }

        let mut changed = false;
        let mut removals: Vec<NodeIndex> = vec![];
        let mut phase = 0.0;

        for run in &runs {
            let Some(total) = Self::compose(dag, run) else {
                continue;
            };

            if total.is_identity() {
                phase += total.data[0].arg();
                removals.extend_from_slice(run);
                changed = true;
                continue;
            }

            let (alpha, beta, gamma, run_phase) = total.zyz_decomposition();
            // U(beta, alpha, gamma) = e^(i*(alpha+gamma)/2) Rz(a) Ry(b) Rz(g),
            // so the leftover phase goes into the DAG's global phase.
            phase += run_phase - (alpha + gamma) / 2.0;

            if let Some(inst) = dag.get_instruction_mut(run[0]) {
                inst.kind = InstructionKind::Gate(StandardGate::U(
                    Unitary2x2::normalize_angle(beta),
                    Unitary2x2::normalize_angle(alpha),
                    Unitary2x2::normalize_angle(gamma),
                ));
            }
            removals.extend_from_slice(&run[1..]);
            changed = true;
        }

        if changed {
            debug!(runs = runs.len(), removed = removals.len(), "fused single-qubit runs");
            removals.sort_by(|a, b| b.cmp(a));
            for node in removals {
                dag.remove_op(node)?;
            }
            dag.set_global_phase(dag.global_phase() + phase);
        }
        Ok(changed)
    }
}
