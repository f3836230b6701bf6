//! The single-strategy compilation pipeline.
//!
//! Optimize, analyze lifetimes, allocate slots, insert recycling resets,
//! route against the slot connectivity, then schedule. Each stage hands
//! an explicit value to the next; nothing is shared or mutated across
//! candidates.

use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use tierq_ir::{Circuit, CircuitDag, Instruction, QubitId};
use tierq_mem::{Allocation, LifetimeTable, MemoryHierarchy, QubitAllocator};

use crate::error::CompileResult;
use crate::mapper::{Connectivity, QubitMapper, SlotMap};
use crate::meta::Strategy;
use crate::optimizer::Optimizer;
use crate::report::Metrics;
use crate::sched::{GateScheduler, Schedule};

/// A fully compiled circuit: the transformed IR plus everything needed
/// to interpret it.
#[derive(Debug, Clone)]
pub struct CompiledCircuit {
    pub circuit: Circuit,
    pub allocation: Allocation,
    pub schedule: Schedule,
    pub metrics: Metrics,
}

/// Compile one circuit under one fixed strategy.
#[instrument(skip(circuit, hierarchy, connectivity), fields(strategy = %strategy))]
pub fn run_strategy(
    circuit: &Circuit,
    hierarchy: &MemoryHierarchy,
    strategy: Strategy,
    connectivity: Option<&Connectivity>,
) -> CompileResult<CompiledCircuit> {
    let mut dag = circuit.dag().clone();

    Optimizer::new(strategy.opt_level).run(&mut dag)?;

    let table = LifetimeTable::analyze(&dag);
    let allocator = QubitAllocator::new(hierarchy, strategy.allocation, strategy.recycling);
    let mut allocation = allocator.allocate(&table)?;

    let (mut dag, step_map) = insert_recycling_resets(&dag, &allocation)?;
    allocation.remap_steps(&step_map);

    if let Some(connectivity) = connectivity {
        let slots = SlotMap::from_allocation(&allocation, hierarchy);
        let mapper = QubitMapper::new(connectivity.clone());
        let (routed, _, step_map) = mapper.run(&dag, slots)?;
        allocation.remap_steps(&step_map);
        dag = routed;
    }

    let schedule = GateScheduler::new(hierarchy).run(&mut dag, &allocation)?;
    let metrics = Metrics::measure(&dag, &allocation, &schedule, hierarchy);
    debug!(?metrics, "strategy compiled");

    let mut compiled = Circuit::from_dag(dag);
    compiled.set_name(circuit.name());

    Ok(CompiledCircuit {
        circuit: compiled,
        allocation,
        schedule,
        metrics,
    })
}

/// Rebuild the DAG with a reset in front of the first use of every
/// qubit that moves into a previously occupied slot.
///
/// Also returns the map from input to output operation steps, so the
/// caller can renumber the allocation to match the rebuilt circuit.
fn insert_recycling_resets(
    dag: &CircuitDag,
    allocation: &Allocation,
) -> CompileResult<(CircuitDag, Vec<u32>)> {
    if allocation.resets.is_empty() {
        let identity = (0..dag.num_ops() as u32).collect();
        return Ok((dag.clone(), identity));
    }

    let mut pending: FxHashSet<QubitId> = FxHashSet::default();
    for reset in &allocation.resets {
        pending.insert(reset.incoming);
    }

    let mut rebuilt = CircuitDag::new();
    for qubit in dag.qubits() {
        rebuilt.add_qubit(qubit);
    }
    for clbit in dag.clbits() {
        rebuilt.add_clbit(clbit);
    }
    rebuilt.set_global_phase(dag.global_phase());

    let mut step_map = Vec::with_capacity(dag.num_ops());
    let mut next_step = 0u32;
    for (_, inst) in dag.topological_ops() {
        for &qubit in &inst.qubits {
            if pending.remove(&qubit) {
                rebuilt.push(Instruction::reset(qubit))?;
                next_step += 1;
            }
        }
        rebuilt.push(inst.clone())?;
        step_map.push(next_step);
        next_step += 1;
    }
    Ok((rebuilt, step_map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierq_ir::ClbitId;
    use tierq_mem::{AllocationStrategy, MemoryLevel, RecyclingPolicy};
    use crate::optimizer::OptLevel;

    fn strategy() -> Strategy {
        Strategy {
            allocation: AllocationStrategy::Lifetime,
            opt_level: OptLevel::O1,
            recycling: RecyclingPolicy::ResetBased,
        }
    }

    #[test]
    fn test_bell_compiles() {
        let circuit = Circuit::bell().unwrap();
        let hierarchy = MemoryHierarchy::standard();
        let compiled = run_strategy(&circuit, &hierarchy, strategy(), None).unwrap();

        assert_eq!(compiled.metrics.qubits_used, 2);
        assert!(compiled.metrics.depth >= 2);
        assert!(compiled.metrics.estimated_error > 0.0);
    }

    #[test]
    fn test_reset_inserted_before_reused_slot() {
        let mut c = Circuit::with_size("t", 3, 1);
        c.h(QubitId(0)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.measure(QubitId(0), ClbitId(0)).unwrap();
        c.h(QubitId(2)).unwrap();
        c.cx(QubitId(2), QubitId(1)).unwrap();

        let hierarchy =
            MemoryHierarchy::new(vec![MemoryLevel::new("fast", 2, 1, 0.001, 1000)]).unwrap();
        let compiled = run_strategy(&c, &hierarchy, strategy(), None).unwrap();

        assert_eq!(compiled.metrics.qubits_used, 2);
        assert_eq!(compiled.allocation.resets.len(), 1);
        let names: Vec<_> = compiled
            .circuit
            .dag()
            .topological_ops()
            .filter(|(_, i)| i.qubits.contains(&QubitId(2)))
            .map(|(_, i)| i.name())
            .collect();
        assert_eq!(names.first(), Some(&"reset"));
    }

    #[test]
    fn test_capacity_failure_propagates() {
        let circuit = Circuit::ghz(3).unwrap();
        let hierarchy =
            MemoryHierarchy::new(vec![MemoryLevel::new("fast", 2, 1, 0.001, 1000)]).unwrap();
        let err = run_strategy(&circuit, &hierarchy, strategy(), None).unwrap_err();
        assert!(matches!(err, crate::error::CompileError::Allocation(_)));
    }

    #[test]
    fn test_routing_included_when_connectivity_given() {
        // q1 and q0 land in slots 0 and 1, which are only connected
        // through slot 2. Slot 2 holds the long-lived q2, so routing has
        // to emit one real swap.
        let mut c = Circuit::with_size("t", 3, 0);
        c.rx(0.1, QubitId(2)).unwrap();
        c.h(QubitId(0)).unwrap();
        c.h(QubitId(1)).unwrap();
        c.cx(QubitId(0), QubitId(1)).unwrap();
        c.rx(0.2, QubitId(2)).unwrap();

        let hierarchy =
            MemoryHierarchy::new(vec![MemoryLevel::new("fast", 3, 1, 0.001, 1000)]).unwrap();
        let mut connectivity = Connectivity::new(3);
        connectivity.add_edge(1, 2);
        connectivity.add_edge(2, 0);
        let compiled =
            run_strategy(&c, &hierarchy, strategy(), Some(&connectivity)).unwrap();

        let swaps = compiled
            .circuit
            .dag()
            .topological_ops()
            .filter(|(_, i)| i.name() == "swap")
            .count();
        assert_eq!(swaps, 1);
    }
}
