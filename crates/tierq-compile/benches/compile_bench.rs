//! Benchmarks for the compilation pipeline
//!
//! Run with: cargo bench -p tierq-compile

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tierq_compile::{compile, run_strategy, CompileOptions, OptLevel, Optimizer, Strategy};
use tierq_ir::{Circuit, QubitId};
use tierq_mem::{AllocationStrategy, MemoryHierarchy, RecyclingPolicy};

fn staircase_circuit(n: u32) -> Circuit {
    let mut circuit = Circuit::with_size("staircase", n, n);
    for i in 0..n {
        circuit.h(QubitId(i)).unwrap();
        circuit.t(QubitId(i)).unwrap();
    }
    for i in 0..n.saturating_sub(1) {
        circuit.cx(QubitId(i), QubitId(i + 1)).unwrap();
    }
    circuit.measure_all().unwrap();
    circuit
}

/// Benchmark the optimizer in isolation
fn bench_optimizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimizer");

    for num_qubits in &[5u32, 10, 20] {
        group.bench_with_input(
            BenchmarkId::new("o2_fixpoint", num_qubits),
            num_qubits,
            |b, &n| {
                let circuit = staircase_circuit(n);
                b.iter(|| {
                    let mut dag = circuit.dag().clone();
                    Optimizer::new(OptLevel::O2)
                        .run(black_box(&mut dag))
                        .unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a single lifetime-allocated strategy end to end
fn bench_single_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_strategy");
    let hierarchy = MemoryHierarchy::standard();
    let strategy = Strategy {
        allocation: AllocationStrategy::Lifetime,
        opt_level: OptLevel::O2,
        recycling: RecyclingPolicy::ResetBased,
    };

    for num_qubits in &[5u32, 10, 20, 40] {
        group.bench_with_input(
            BenchmarkId::new("lifetime_o2", num_qubits),
            num_qubits,
            |b, &n| {
                let circuit = staircase_circuit(n);
                b.iter(|| {
                    run_strategy(
                        black_box(&circuit),
                        black_box(&hierarchy),
                        strategy,
                        None,
                    )
                    .unwrap()
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the full strategy search
fn bench_strategy_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategy_search");
    let hierarchy = MemoryHierarchy::standard();
    let options = CompileOptions::default();

    for num_qubits in &[5u32, 10, 20] {
        group.bench_with_input(
            BenchmarkId::new("default_candidates", num_qubits),
            num_qubits,
            |b, &n| {
                let circuit = staircase_circuit(n);
                b.iter(|| compile(black_box(&circuit), black_box(&hierarchy), &options).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_optimizer,
    bench_single_strategy,
    bench_strategy_search
);
criterion_main!(benches);
