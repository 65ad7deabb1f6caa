use std::rc::Rc;

use crate::entity::FlowEntity;
use crate::error::{EngineError, EngineResult};
use crate::event::{Event, Handler};
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Decomposes a `BatchEntity` back into its constituents, each continuing
/// independently to `successor`. Only accepts batch entities.
pub struct SeparateModule {
    pub name: String,
    successor: Rc<dyn ModuleNode>,
}

impl SeparateModule {
    pub fn new(name: impl Into<String>, successor: Rc<dyn ModuleNode>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            successor,
        })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        let batch = event
            .entity
            .as_batch()
            .expect("refused at ingest_entity; only batches reach here")
            .clone();

        sys_var.dispose(batch.ind, event.time);
        sys_var.trace(batch.ind, format!("Exit {}", self.name), event.time);

        let mut events = Vec::new();
        for constituent in batch.batched_entities {
            sys_var.trace(constituent.ind, format!("Exit {}", self.name), event.time);
            events.extend(
                self.successor
                    .clone()
                    .ingest_entity(FlowEntity::Single(constituent), event.time)?,
            );
        }
        Ok(events)
    }
}

impl ModuleNode for SeparateModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        if entity.as_batch().is_none() {
            return Err(EngineError::ExpectedBatchEntity {
                module: self.name.clone(),
            });
        }
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        Ok(vec![Event::new(t, "Separate", entity, handler)])
    }
}
