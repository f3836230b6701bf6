//! Strategy search over compilation candidates.
//!
//! Every candidate is compiled independently from the same inputs, then
//! scored with a weighted cost; the cheapest result wins.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use tierq_ir::Circuit;
use tierq_mem::{AllocationStrategy, MemoryHierarchy, RecyclingPolicy};

use crate::error::{CompileError, CompileResult};
use crate::mapper::Connectivity;
use crate::optimizer::OptLevel;
use crate::pipeline::{run_strategy, CompiledCircuit};
use crate::report::CandidateReport;

/// One candidate configuration of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub allocation: AllocationStrategy,
    pub opt_level: OptLevel,
    pub recycling: RecyclingPolicy,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.allocation, self.opt_level, self.recycling)
    }
}

/// Weights for the candidate cost function. All default to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostWeights {
    pub qubits: f64,
    pub gates: f64,
    pub depth: f64,
    pub error: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            qubits: 1.0,
            gates: 1.0,
            depth: 1.0,
            error: 1.0,
        }
    }
}

/// Knobs for [`compile`].
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub weights: CostWeights,
    /// Slot connectivity for routing; `None` skips mapping entirely.
    pub connectivity: Option<Connectivity>,
    /// Candidate set; `None` uses [`default_candidates`].
    pub candidates: Option<Vec<Strategy>>,
}

/// The fixed default candidate set.
///
/// Immediate recycling skips the reset between slot occupants and is
/// only safe when residual state cannot leak into later outcomes, so it
/// appears once and never as the sole option for its level.
pub fn default_candidates() -> Vec<Strategy> {
    vec![
        Strategy {
            allocation: AllocationStrategy::Static,
            opt_level: OptLevel::O1,
            recycling: RecyclingPolicy::ResetBased,
        },
        Strategy {
            allocation: AllocationStrategy::Lifetime,
            opt_level: OptLevel::O1,
            recycling: RecyclingPolicy::ResetBased,
        },
        Strategy {
            allocation: AllocationStrategy::Lifetime,
            opt_level: OptLevel::O2,
            recycling: RecyclingPolicy::ResetBased,
        },
        Strategy {
            allocation: AllocationStrategy::Lifetime,
            opt_level: OptLevel::O3,
            recycling: RecyclingPolicy::ResetBased,
        },
        Strategy {
            allocation: AllocationStrategy::Lifetime,
            opt_level: OptLevel::O2,
            recycling: RecyclingPolicy::Immediate,
        },
    ]
}

/// The outcome of a full strategy search.
#[derive(Debug)]
pub struct CompileReport {
    /// The cheapest successfully compiled candidate.
    pub winner: CompiledCircuit,
    /// Label of the winning strategy.
    pub chosen: String,
    /// Every successful candidate, in candidate order.
    pub candidates: Vec<CandidateReport>,
}

/// Compile a circuit by evaluating every candidate strategy and keeping
/// the cheapest result.
///
/// Candidates run on scoped worker threads; they share only immutable
/// references to the inputs. Ties on cost break by lowest slot count,
/// then lowest depth, then candidate order. A candidate that fails is
/// dropped; only when all fail does an error reach the caller.
#[instrument(skip_all, fields(circuit = circuit.name()))]
pub fn compile(
    circuit: &Circuit,
    hierarchy: &MemoryHierarchy,
    options: &CompileOptions,
) -> CompileResult<CompileReport> {
    let candidates = options
        .candidates
        .clone()
        .unwrap_or_else(default_candidates);
    let connectivity = options.connectivity.as_ref();

    let outcomes: Vec<CompileResult<CompiledCircuit>> = std::thread::scope(|scope| {
        let handles: Vec<_> = candidates
            .iter()
            .map(|&strategy| {
                scope.spawn(move || run_strategy(circuit, hierarchy, strategy, connectivity))
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("candidate worker panicked"))
            .collect()
    });

    let mut reports = vec![];
    let mut failures = vec![];
    let mut best: Option<(usize, CompiledCircuit)> = None;
    let mut best_key = (f64::INFINITY, usize::MAX, usize::MAX);

    for (strategy, outcome) in candidates.iter().zip(outcomes) {
        match outcome {
            Ok(compiled) => {
                let m = &compiled.metrics;
                let w = &options.weights;
                let cost = w.qubits * m.qubits_used as f64
                    + w.gates * m.gate_count as f64
                    + w.depth * m.depth as f64
                    + w.error * m.estimated_error;
                debug!(strategy = %strategy, cost, "candidate compiled");
                reports.push(CandidateReport {
                    strategy: strategy.to_string(),
                    metrics: compiled.metrics,
                    cost,
                });
                let key = (cost, m.qubits_used, m.depth);
                if key < best_key {
                    best_key = key;
                    best = Some((reports.len() - 1, compiled));
                }
            }
            Err(err) => {
                debug!(strategy = %strategy, error = %err, "candidate failed");
                failures.push(format!("{strategy}: {err}"));
            }
        }
    }

    match best {
        Some((index, winner)) => {
            let chosen = reports[index].strategy.clone();
            info!(chosen = %chosen, cost = best_key.0, "strategy search complete");
            Ok(CompileReport {
                winner,
                chosen,
                candidates: reports,
            })
        }
        None => Err(CompileError::AllCandidatesFailed(failures)),
    }
}
