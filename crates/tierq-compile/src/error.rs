//! Error types for the compilation pipeline.

use thiserror::Error;
use tierq_ir::IrError;
use tierq_mem::{AllocError, HierarchyError};

/// Errors that can occur during compilation.
///
/// Every variant is fatal for the candidate strategy in which it occurs.
/// The meta-compiler recovers by discarding the candidate; only when all
/// candidates fail does an error reach the caller.
#[derive(Error, Debug)]
pub enum CompileError {
    /// Malformed memory hierarchy configuration.
    #[error("configuration error: {0}")]
    Config(#[from] HierarchyError),

    /// The allocator could not place every qubit.
    #[error("allocation error: {0}")]
    Allocation(#[from] AllocError),

    /// No connectivity path between the operands of a two-qubit gate.
    #[error("mapping error: no path between slot {from} and slot {to}")]
    Mapping { from: u32, to: u32 },

    /// The circuit DAG rejected an operation.
    #[error("circuit error: {0}")]
    Ir(#[from] IrError),

    /// Every candidate strategy failed. Carries one reason per candidate.
    #[error("all {} candidate strategies failed: {}", .0.len(), .0.join("; "))]
    AllCandidatesFailed(Vec<String>),
}

/// Result type alias for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
