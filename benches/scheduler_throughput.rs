//! Throughput of the scheduler loop itself: how many arrival/seize/delay/
//! release/dispose events per second through a single-resource queue.

use std::cell::RefCell;
use std::rc::Rc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use desim_engine::streams::{ConstantDelay, FixedArrivals};
use desim_engine::{CostAllocation, CreateModule, DelayModule, DisposeModule, Environment, ReleaseModule, Resource, SeizeModule};

fn run_queue(num_arrivals: usize) {
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let resource = Rc::new(RefCell::new(Resource::new("Server", 4)));

    let dispose = DisposeModule::new("Dispose");
    let release = ReleaseModule::new("Release", 1, Rc::clone(&resource), dispose);
    let delay = DelayModule::new(
        "Service",
        CostAllocation::ValueAdded,
        Box::new(ConstantDelay(1.0)),
        release,
    );
    let seize = SeizeModule::new("Seize", 1, resource, delay);

    let arrivals: Vec<f64> = (0..num_arrivals).map(|i| i as f64 * 0.25).collect();
    let create = CreateModule::new(
        "Arrive",
        "Job",
        Box::new(FixedArrivals(arrivals)),
        0.0,
        1,
        None,
        id_gen,
        seize,
    );

    let horizon = num_arrivals as f64 * 0.25 + 200.0;
    Environment::new()
        .add_arrival_module(create)
        .run_simulation(horizon)
        .expect("bench graph must not error");
}

fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler_throughput");
    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| run_queue(size));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scheduler);
criterion_main!(benches);
