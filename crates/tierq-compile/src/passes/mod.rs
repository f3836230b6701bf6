//! Optimization passes over circuit DAGs.

mod cancel;
mod dce;
mod fuse;

pub use cancel::{CancelInversePairs, CancelTwoQubitPairs};
pub use dce::EliminateDeadGates;
pub use fuse::FuseSingleQubitRuns;
