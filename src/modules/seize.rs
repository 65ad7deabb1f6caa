use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::FlowEntity;
use crate::error::EngineResult;
use crate::event::{Event, Handler};
use crate::resource::Resource;
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Seizes `num_resources` units of `resource`, queuing on the resource if
/// not enough capacity is immediately available.
pub struct SeizeModule {
    pub name: String,
    pub num_resources: usize,
    resource: Rc<RefCell<Resource>>,
    successor: Rc<dyn ModuleNode>,
}

impl SeizeModule {
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

    /// Invoked either from `ingest_entity` (immediate seize) or from a
    /// `ReleaseModule`-synthesized wakeup (deferred seize); in the latter
    /// case `event.attr` carries `{"wait_time": ...}`.
    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        let wait_time = event.attr.get("wait_time").and_then(|v| v.as_f64());
        for ind in event.entity.constituent_inds() {
            if let Some(wt) = wait_time {
                if let Some(m) = sys_var.entity_metrics.get_mut(&ind) {
                    m.wait_time += wt;
                }
            }
            sys_var.trace(ind, format!("Exit {}", self.name), event.time);
        }
        self.successor
            .clone()
            .ingest_entity(event.entity.clone(), event.time)
    }
}

impl ModuleNode for SeizeModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let mut resource = self.resource.borrow_mut();
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));

        if resource.has_capacity(self.num_resources) {
            resource.seize(self.num_resources, t)?;
            drop(resource);
            Ok(vec![Event::new(t, "Seize", entity, handler)])
        } else {
            resource.queue_entity(entity, self.num_resources, t, handler);
            tracing::debug!(module = %self.name, time = t, "queued, insufficient capacity");
            Ok(vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityId};
    use crate::modules::DisposeModule;

    #[test]
    fn second_seize_queues_when_capacity_exhausted() {
        let resource = Rc::new(RefCell::new(Resource::new("r", 1)));
        let dispose = DisposeModule::new("sink");
        let seize = SeizeModule::new("seize", 1, Rc::clone(&resource), dispose);

        let e1 = FlowEntity::Single(Entity::new(EntityId(0), "widget", 0.0));
        let events = Rc::clone(&seize).ingest_entity(e1, 0.0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(resource.borrow().available(), 0);

        let e2 = FlowEntity::Single(Entity::new(EntityId(1), "widget", 0.0));
        let events = seize.ingest_entity(e2, 0.0).unwrap();
        assert!(events.is_empty());
        assert_eq!(resource.borrow().available(), 0);
    }
}
