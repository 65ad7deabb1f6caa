use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::entity::FlowEntity;
use crate::error::EngineResult;
use crate::event::{Event, Handler};
use crate::resource::Resource;
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Releases `num_resources` units back to `resource`, waking the head of
/// its waiting queue (if any fits) with a synthesized seize event at the
/// same timestamp.
pub struct ReleaseModule {
    pub name: String,
    pub num_resources: usize,
    resource: Rc<RefCell<Resource>>,
    successor: Rc<dyn ModuleNode>,
}

impl ReleaseModule {
    pub fn new(
        name: impl Into<String>,
        num_resources: usize,
        resource: Rc<RefCell<Resource>>,
        successor: Rc<dyn ModuleNode>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            num_resources,
            resource,
            successor,
        })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        for ind in event.entity.constituent_inds() {
            sys_var.trace(ind, format!("Exit {}", self.name), event.time);
        }
        self.successor
            .clone()
            .ingest_entity(event.entity.clone(), event.time)
    }
}

impl ModuleNode for ReleaseModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let woken = self.resource.borrow_mut().release(self.num_resources, t)?;

        let mut events = Vec::new();
        if let Some(w) = woken {
            tracing::debug!(module = %self.name, time = t, woken = w.entity.ind().0, "woke queued seize");
            events.push(
                Event::new(t, "Seize", w.entity, w.handler)
                    .with_attr(json!({ "wait_time": w.wait_time })),
            );
        }

        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        events.push(Event::new(t, "Release", entity, handler));
        Ok(events)
    }
}
