//! The scheduler: a single time-ordered event queue driving the whole run.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::rc::Rc;

use serde_json::Value;

use crate::entity::EntityIdGen;
use crate::error::EngineResult;
use crate::event::Event;
use crate::modules::create::CreateModule;
use crate::report::SimulationOutput;
use crate::sys_var::SysVar;

/// Host-facing entry point. Construct one, register arrival sources and
/// pre-run variables, then call [`Environment::run_simulation`].
pub struct Environment {
    id_gen: Rc<RefCell<EntityIdGen>>,
    arrivals: Vec<Rc<CreateModule>>,
    variables: Vec<(String, Value)>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            id_gen: Rc::new(RefCell::new(EntityIdGen::default())),
            arrivals: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// Shared id generator, handed to module constructors that mint new
    /// entities (`CreateModule`, `DuplicateModule`, `BatchModule`).
    pub fn id_gen(&self) -> Rc<RefCell<EntityIdGen>> {
        Rc::clone(&self.id_gen)
    }

    /// Registers a pre-run global variable, seeding `sys_var.variables`.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.push((name.into(), value));
        self
    }

    /// Registers an arrival-source root. A run may have more than one.
    pub fn add_arrival_module(mut self, module: Rc<CreateModule>) -> Self {
        self.arrivals.push(module);
        self
    }

    /// Runs the simulation up to `duration`, returning the final system
    /// state plus derived reporting views.
    pub fn run_simulation(self, duration: f64) -> EngineResult<SimulationOutput> {
        let mut sys_var = SysVar::new();
        for (name, value) in self.variables {
            sys_var.variables.insert(name, value);
        }

        let mut queue: BinaryHeap<Reverse<Event>> = BinaryHeap::new();
        for arrival in &self.arrivals {
            for event in arrival.generate_arrivals(duration)? {
                queue.push(Reverse(event));
            }
        }

        tracing::info!(horizon = duration, arrivals = self.arrivals.len(), "simulation start");

        let mut processed = 0usize;
        while let Some(Reverse(event)) = queue.pop() {
            if event.time > duration {
                break;
            }
            tracing::debug!(time = event.time, entity = event.entity_ind().0, name = %event.name, "dispatch");
            let new_events = (event.handler)(&event, &mut sys_var)?;
            for e in new_events {
                queue.push(Reverse(e));
            }
            processed += 1;
        }

        sys_var.finalize_aggregates();
        tracing::info!(events_processed = processed, entities = sys_var.entity_metrics.len(), "simulation end");

        Ok(SimulationOutput::from_sys_var(sys_var, duration))
    }
}
