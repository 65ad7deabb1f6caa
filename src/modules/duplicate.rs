use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::{EntityIdGen, FlowEntity};
use crate::error::{EngineError, EngineResult};
use crate::event::{Event, Handler};
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Clones an entity into two independent flows: the original continues to
/// `next_module_orig`, a fresh duplicate continues to `next_module_dup`.
/// Does not accept batch entities.
pub struct DuplicateModule {
    pub name: String,
    id_gen: Rc<RefCell<EntityIdGen>>,
    next_module_orig: Rc<dyn ModuleNode>,
    next_module_dup: Rc<dyn ModuleNode>,
}

impl DuplicateModule {
    pub fn new(
        name: impl Into<String>,
        id_gen: Rc<RefCell<EntityIdGen>>,
        next_module_orig: Rc<dyn ModuleNode>,
        next_module_dup: Rc<dyn ModuleNode>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            id_gen,
            next_module_orig,
            next_module_dup,
        })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        let original = event
            .entity
            .as_single()
            .expect("refused at ingest_entity; only single entities reach here")
            .clone();

        let new_ind = self.id_gen.borrow_mut().next();
        let duplicate = original.duplicate(new_ind, event.time);
        sys_var.init_entity(duplicate.ind, &duplicate.entity_type, event.time);

        sys_var.trace(original.ind, format!("Exit {}", self.name), event.time);
        sys_var.trace(duplicate.ind, format!("Exit {}", self.name), event.time);

        let mut events = self
            .next_module_orig
            .clone()
            .ingest_entity(FlowEntity::Single(original), event.time)?;
        events.extend(
            self.next_module_dup
                .clone()
                .ingest_entity(FlowEntity::Single(duplicate), event.time)?,
        );
        Ok(events)
    }
}

impl ModuleNode for DuplicateModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        if entity.as_batch().is_some() {
            return Err(EngineError::UnexpectedBatchEntity {
                module: self.name.clone(),
            });
        }
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        Ok(vec![Event::new(t, "Duplicate", entity, handler)])
    }
}
