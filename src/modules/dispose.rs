use std::rc::Rc;

use crate::entity::FlowEntity;
use crate::error::EngineResult;
use crate::event::{Event, Handler};
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Sink: marks every entity it receives (and, for a batch, every
/// constituent) disposed at the event's time.
pub struct DisposeModule {
    pub name: String,
}

impl DisposeModule {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { name: name.into() })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        for ind in event.entity.constituent_inds() {
            sys_var.dispose(ind, event.time);
            sys_var.trace(ind, format!("Exit {}", self.name), event.time);
        }
        Ok(vec![])
    }
}

impl ModuleNode for DisposeModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        Ok(vec![Event::new(t, "Dispose", entity, handler)])
    }
}
