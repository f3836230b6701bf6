//! TIERQ tiered memory model.
//!
//! This crate models the physical side of memory-aware compilation:
//!
//! - [`MemoryHierarchy`]: a validated stack of storage tiers, fastest first,
//!   with per-tier capacity, access latency, error rate, and coherence time,
//!   plus inter-tier transfer times
//! - [`LifetimeTable`]: per-qubit liveness computed from a circuit DAG
//! - [`QubitAllocator`]: assigns qubits to slots, either statically or by
//!   packing disjoint lifetimes into shared slots
//! - [`RecyclingPolicy`]: whether a recycled slot gets a reset before its
//!   next occupant
//!
//! The hierarchy itself is immutable; all occupancy state lives in the
//! [`Allocation`] each compile candidate produces.

pub mod alloc;
pub mod error;
pub mod hierarchy;
pub mod level;
pub mod lifetime;
pub mod recycle;

pub use alloc::{Allocation, AllocationRecord, AllocationStrategy, Placement, QubitAllocator};
pub use error::{AllocError, AllocResult, HierarchyError};
pub use hierarchy::MemoryHierarchy;
pub use level::MemoryLevel;
pub use lifetime::{Lifetime, LifetimeTable};
pub use recycle::{RecyclingPolicy, ResetPoint};
