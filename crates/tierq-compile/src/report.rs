//! Compilation metrics and per-candidate reporting.

use serde::{Deserialize, Serialize};

use tierq_ir::CircuitDag;
use tierq_mem::{Allocation, MemoryHierarchy};

use crate::sched::Schedule;

/// Quality figures for one compiled circuit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Physical slots occupied across the whole run.
    pub qubits_used: usize,
    /// Costed operations after optimization and routing: gates plus any
    /// recycling resets, since each reset is an extra physical operation.
    pub gate_count: usize,
    /// Schedule depth in layers.
    pub depth: usize,
    /// Total schedule latency.
    pub duration: u64,
    /// Summed per-operation tier error rates.
    pub estimated_error: f64,
}

impl Metrics {
    /// Derive metrics from a scheduled circuit.
    pub fn measure(
        dag: &CircuitDag,
        allocation: &Allocation,
        schedule: &Schedule,
        hierarchy: &MemoryHierarchy,
    ) -> Self {
        let mut estimated_error = 0.0;
        let mut gate_count = 0;
        for (step, (_, inst)) in dag.topological_ops().enumerate() {
            if inst.is_gate() || inst.is_reset() {
                gate_count += 1;
            }
            for &qubit in &inst.qubits {
                if let Some((level, _)) = allocation.location_at(qubit, step as u32) {
                    estimated_error += hierarchy.error_rate(level);
                }
            }
        }

        Self {
            qubits_used: allocation.slots_used,
            gate_count,
            depth: schedule.depth,
            duration: schedule.duration,
            estimated_error,
        }
    }
}

/// Outcome of one candidate strategy, kept in the final report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Strategy label, e.g. `lifetime/O2/reset_based`.
    pub strategy: String,
    pub metrics: Metrics,
    /// Weighted cost used for winner selection.
    pub cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_roundtrip_through_json() {
        let metrics = Metrics {
            qubits_used: 2,
            gate_count: 5,
            depth: 4,
            duration: 17,
            estimated_error: 0.004,
        };
        let report = CandidateReport {
            strategy: "lifetime/O2/reset_based".to_string(),
            metrics,
            cost: 26.004,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: CandidateReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.metrics, metrics);
        assert_eq!(back.strategy, report.strategy);
    }
}
