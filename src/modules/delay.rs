use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::FlowEntity;
use crate::error::{EngineError, EngineResult};
use crate::event::{Event, Handler};
use crate::streams::DelayStream;
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Which metrics bucket a `DelayModule`'s elapsed time is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostAllocation {
    ValueAdded,
    NonValueAdded,
    Wait,
    Transfer,
    Other,
}

impl CostAllocation {
    pub fn metric_key(self) -> &'static str {
        match self {
            CostAllocation::ValueAdded => "Value-Added Time",
            CostAllocation::NonValueAdded => "Non-Value-Added Time",
            CostAllocation::Wait => "Wait Time",
            CostAllocation::Transfer => "Transfer Time",
            CostAllocation::Other => "Other Time",
        }
    }
}

impl Default for CostAllocation {
    fn default() -> Self {
        CostAllocation::ValueAdded
    }
}

/// Holds an entity for a sampled duration, charging the elapsed time to one
/// metrics bucket.
pub struct DelayModule {
    pub name: String,
    pub cost_allocation: CostAllocation,
    delay_stream: RefCell<Box<dyn DelayStream>>,
    successor: Rc<dyn ModuleNode>,
}

impl DelayModule {
    pub fn new(
        name: impl Into<String>,
        cost_allocation: CostAllocation,
        delay_stream: Box<dyn DelayStream>,
        successor: Rc<dyn ModuleNode>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            cost_allocation,
            delay_stream: RefCell::new(delay_stream),
            successor,
        })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        let delta = event
            .attr
            .get("delay_time")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        for ind in event.entity.constituent_inds() {
            if let Some(m) = sys_var.entity_metrics.get_mut(&ind) {
                m.add(self.cost_allocation, delta);
            }
            sys_var.trace(ind, format!("Exit {}", self.name), event.time);
        }
        self.successor
            .clone()
            .ingest_entity(event.entity.clone(), event.time)
    }
}

impl ModuleNode for DelayModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let delta = self
            .delay_stream
            .borrow_mut()
            .next_delay()
            .ok_or_else(|| EngineError::StreamExhausted {
                context: format!("delay module {}", self.name),
            })?;
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        Ok(vec![Event::new(t + delta, "Delay", entity, handler)
            .with_attr(json!({ "delay_time": delta }))])
    }
}
