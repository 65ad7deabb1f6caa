//! Runs an M/M/1-style queueing scenario with exponentially distributed
//! arrivals and service times, and prints the per-entity-type summary.
//!
//! Distribution generators live here, not in `src/`: the engine itself only
//! ever consumes an [`ArrivalStream`]/[`DelayStream`], never a distribution.

use std::cell::RefCell;
use std::rc::Rc;

use desim_engine::streams::{ArrivalStream, DelayStream};
use desim_engine::{
    CostAllocation, CreateModule, DelayModule, DisposeModule, Environment, ReleaseModule,
    Resource, SeizeModule,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};

struct ExponentialArrivals {
    rng: StdRng,
    rate: f64,
}

impl ArrivalStream for ExponentialArrivals {
    fn generate(&mut self, start: f64, end: f64) -> Vec<f64> {
        let dist = Exp::new(self.rate).expect("rate must be positive");
        let mut t = start;
        let mut out = Vec::new();
        while t < end {
            t += dist.sample(&mut self.rng);
            if t < end {
                out.push(t);
            }
        }
        out
    }
}

struct ExponentialDelays {
    rng: StdRng,
    rate: f64,
}

impl DelayStream for ExponentialDelays {
    fn next_delay(&mut self) -> Option<f64> {
        let dist = Exp::new(self.rate).expect("rate must be positive");
        Some(dist.sample(&mut self.rng))
    }
}

fn main() {
    tracing_subscriber::fmt::try_init().ok();

    let horizon = 1_000.0;
    let id_gen = Rc::new(RefCell::new(desim_engine::entity::EntityIdGen::default()));
    let clerk = Rc::new(RefCell::new(Resource::new("Clerk", 1)));

    let dispose = DisposeModule::new("Dispose");
    let release = ReleaseModule::new("Release", 1, Rc::clone(&clerk), dispose);
    let service = DelayModule::new(
        "Service",
        CostAllocation::ValueAdded,
        Box::new(ExponentialDelays {
            rng: StdRng::seed_from_u64(7),
            rate: 1.0 / 8.0,
        }),
        release,
    );
    let seize = SeizeModule::new("Seize", 1, Rc::clone(&clerk), service);
    let arrive = CreateModule::new(
        "Arrive",
        "Customer",
        Box::new(ExponentialArrivals {
            rng: StdRng::from_entropy(),
            rate: 1.0 / 10.0,
        }),
        0.0,
        1,
        None,
        id_gen,
        seize,
    );

    let output = Environment::new()
        .add_arrival_module(arrive)
        .run_simulation(horizon)
        .expect("simulation should not error on this graph");

    println!("Clerk utilization: {:.3}", output.utilization_of(&clerk.borrow()));
    for summary in output.entity_type_summary() {
        println!(
            "{}: n={} mean_time_in_system={:?} mean_wait={:.3}",
            summary.entity_type, summary.count, summary.mean_time_in_system, summary.mean_wait_time
        );
    }
}
