//! The level-gated optimization driver.

use tracing::{debug, instrument};

use tierq_ir::CircuitDag;

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::{CancelInversePairs, CancelTwoQubitPairs, EliminateDeadGates, FuseSingleQubitRuns};

/// How aggressively to optimize a circuit before allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum OptLevel {
    /// No optimization.
    O0,
    /// Inverse-pair cancellation.
    #[default]
    O1,
    /// Adds single-qubit fusion and two-qubit pair cancellation.
    O2,
    /// Adds dead gate elimination and a higher iteration ceiling.
    O3,
}

impl OptLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            OptLevel::O0 => 0,
            OptLevel::O1 => 1,
            OptLevel::O2 => 2,
            OptLevel::O3 => 3,
        }
    }
}

impl std::fmt::Display for OptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "O{}", self.as_u8())
    }
}

/// Runs the pass pipeline for a given level to a fixpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct Optimizer {
    level: OptLevel,
}

impl Optimizer {
    pub fn new(level: OptLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> OptLevel {
        self.level
    }

    fn passes(&self) -> Vec<Box<dyn Pass>> {
        let mut passes: Vec<Box<dyn Pass>> = vec![];
        if self.level >= OptLevel::O1 {
            passes.push(Box::new(CancelInversePairs::new()));
        }
        if self.level >= OptLevel::O2 {
            passes.push(Box::new(FuseSingleQubitRuns::new()));
            passes.push(Box::new(CancelTwoQubitPairs::new()));
        }
        if self.level >= OptLevel::O3 {
            passes.push(Box::new(EliminateDeadGates::new()));
        }
        passes
    }

    fn max_iterations(&self) -> usize {
        match self.level {
            OptLevel::O3 => 20,
            _ => 10,
        }
    }

    /// Run all passes repeatedly until no pass reports a change, or the
    /// iteration ceiling is hit. Returns whether anything changed at all.
    #[instrument(skip_all, fields(level = %self.level))]
    pub fn run(&self, dag: &mut CircuitDag) -> CompileResult<bool> {
        let passes = self.passes();
        let mut changed_any = false;

        for iteration in 0..self.max_iterations() {
            let mut changed = false;
            for pass in &passes {
                if pass.run(dag)? {
                    debug!(pass = pass.name(), iteration, "pass modified circuit");
                    changed = true;
                }
            }
            if !changed {
                return Ok(changed_any);
            }
            changed_any = true;
        }
        Ok(changed_any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierq_ir::{Circuit, ClbitId, QubitId};

    fn noisy_circuit() -> CircuitDag {
        let mut c = Circuit::with_size("t", 2, 2);
        c.h(QubitId(0)).unwrap();
        c.h(QubitId(0)).unwrap();
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.t(QubitId(1)).unwrap();
        c.tdg(QubitId(1)).unwrap();
        c.measure(QubitId(0), ClbitId(0)).unwrap();
        c.into_dag()
    }

    #[test]
    fn test_level_zero_is_noop() {
        let mut dag = noisy_circuit();
        let before = dag.num_ops();
        let changed = Optimizer::new(OptLevel::O0).run(&mut dag).unwrap();
        assert!(!changed);
        assert_eq!(dag.num_ops(), before);
    }

    #[test]
    fn test_level_one_cancels_pairs() {
        let mut dag = noisy_circuit();
        Optimizer::new(OptLevel::O1).run(&mut dag).unwrap();
        // One H survives out of three; the CX pair needs level 2.
        let h_count = dag
            .topological_ops()
            .filter(|(_, i)| i.name() == "h")
            .count();
        assert_eq!(h_count, 1);
        let cx_count = dag
            .topological_ops()
            .filter(|(_, i)| i.name() == "cx")
            .count();
        assert_eq!(cx_count, 2);
    }

    #[test]
    fn test_level_two_cancels_cx_pair() {
        let mut dag = noisy_circuit();
        Optimizer::new(OptLevel::O2).run(&mut dag).unwrap();
        let cx_count = dag
            .topological_ops()
            .filter(|(_, i)| i.name() == "cx")
            .count();
        assert_eq!(cx_count, 0);
    }

    #[test]
    fn test_optimizer_reaches_fixpoint() {
        for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2, OptLevel::O3] {
            let mut dag = noisy_circuit();
            let optimizer = Optimizer::new(level);
            optimizer.run(&mut dag).unwrap();
            let changed = optimizer.run(&mut dag).unwrap();
            assert!(!changed, "second run changed the circuit at {level}");
        }
    }

    #[test]
    fn test_level_three_removes_dead_tail() {
        let mut c = Circuit::with_size("t", 1, 0);
        c.h(QubitId(0)).unwrap();
        c.t(QubitId(0)).unwrap();
        c.h(QubitId(0)).unwrap();
        let mut dag = c.into_dag();

        Optimizer::new(OptLevel::O3).run(&mut dag).unwrap();
        assert_eq!(dag.num_ops(), 0);
    }
}
