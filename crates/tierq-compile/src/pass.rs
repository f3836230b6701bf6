//! The optimization pass abstraction.

use tierq_ir::CircuitDag;

use crate::error::CompileResult;

/// A transformation over a circuit DAG.
///
/// Passes communicate only through the DAG itself. A pass reports whether
/// it changed anything so the [`Optimizer`](crate::optimizer::Optimizer)
/// can drive the pipeline to a fixpoint.
pub trait Pass {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Run the pass, returning `true` if the DAG was modified.
    fn run(&self, dag: &mut CircuitDag) -> CompileResult<bool>;
}
