//! Memory-aware quantum circuit compilation.
//!
//! The pipeline takes a [`tierq_ir::Circuit`] and a
//! [`tierq_mem::MemoryHierarchy`] and produces a scheduled circuit whose
//! live qubits occupy as few physical slots as the chosen strategy
//! allows. [`compile`] searches a set of candidate strategies in
//! parallel and returns the cheapest result.
//!
//! ```
//! use tierq_compile::{compile, CompileOptions};
//! use tierq_ir::Circuit;
//! use tierq_mem::MemoryHierarchy;
//!
//! let circuit = Circuit::bell()?;
//! let hierarchy = MemoryHierarchy::standard();
//! let report = compile(&circuit, &hierarchy, &CompileOptions::default())?;
//! assert_eq!(report.winner.metrics.qubits_used, 2);
//! # Ok::<(), tierq_compile::CompileError>(())
//! ```

pub mod error;
pub mod mapper;
pub mod meta;
pub mod optimizer;
pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod report;
pub mod sched;
pub mod unitary;

pub use error::{CompileError, CompileResult};
pub use mapper::{Connectivity, QubitMapper, SlotMap};
pub use meta::{compile, default_candidates, CompileOptions, CompileReport, CostWeights, Strategy};
pub use optimizer::{OptLevel, Optimizer};
pub use pass::Pass;
pub use pipeline::{run_strategy, CompiledCircuit};
pub use report::{CandidateReport, Metrics};
pub use sched::{GateScheduler, Layer, Schedule, TransferOp};
pub use unitary::Unitary2x2;
