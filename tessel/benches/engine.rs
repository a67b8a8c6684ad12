//! Run both engines over the same programs:
//!   cargo bench --bench engine

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tessel::{EngineKind, HostPlatform, VM, VMCreateInfo};

fn create_vm(engine: EngineKind) -> VM {
    let info = VMCreateInfo {
        engine,
        ..Default::default()
    };
    VM::new(info, Arc::new(HostPlatform::new())).expect("VM startup failed")
}

fn bench_program(c: &mut Criterion, name: &str, setup: &str, program: &str) {
    for (engine, suffix) in [
        (EngineKind::Cooperative, "cooperative"),
        (EngineKind::Synchronous, "synchronous"),
    ] {
        let mut vm = create_vm(engine);
        vm.eval(setup, Some("setup.tsl")).expect("Setup failed");

        c.bench_function(&format!("{name}_{suffix}"), |b| {
            b.iter(|| {
                vm.eval(black_box(program), None).expect("Benchmark failed");
            });
        });
    }
}

/// Tail-recursive loop through the core library.
fn bench_countdown(c: &mut Criterion) {
    bench_program(
        c,
        "times_repeat_100",
        "counter = Object.clone(); counter.n = 0",
        "100.timesRepeat({|| counter.n = counter.n + 1})",
    );
}

/// Deep non-tail recursion with two sends per call.
fn bench_fibonacci(c: &mut Criterion) {
    bench_program(
        c,
        "fibonacci_12",
        "fib = {|n| (n < 2).if({|| n}, {|| fib(n - 1) + fib(n - 2)})}",
        "fib(12)",
    );
}

/// Slot reads and writes on an object found through its parents.
fn bench_slot_access(c: &mut Criterion) {
    bench_program(
        c,
        "slot_access_100",
        "base = Object.clone(); base.step = 2\n\
         child = base.clone(); child.total = 0",
        "1.to(100, {|i| child.total = child.total + child.step})",
    );
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_countdown, bench_fibonacci, bench_slot_access
}

criterion_main!(benches);
