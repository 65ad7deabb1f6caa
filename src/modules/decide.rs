use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::entity::FlowEntity;
use crate::error::EngineResult;
use crate::event::{Event, Handler};
use crate::sys_var::SysVar;

use super::ModuleNode;

pub type ConditionFn = Rc<dyn Fn(&HashMap<String, Value>, &HashMap<String, Value>) -> bool>;

/// Routes an entity to one of two successors based on a single evaluation
/// of `condition` against the current variables and the entity's attributes.
pub struct DecideTwoWayModule {
    pub name: String,
    condition: ConditionFn,
    true_next_module: Rc<dyn ModuleNode>,
    false_next_module: Rc<dyn ModuleNode>,
}

impl DecideTwoWayModule {
    pub fn new(
        name: impl Into<String>,
        condition: ConditionFn,
        true_next_module: Rc<dyn ModuleNode>,
        false_next_module: Rc<dyn ModuleNode>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            condition,
            true_next_module,
            false_next_module,
        })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        for ind in event.entity.constituent_inds() {
            sys_var.trace(ind, format!("Exit {}", self.name), event.time);
        }
        let taken = (self.condition)(&sys_var.variables, event.entity.attr());
        let branch = if taken {
            &self.true_next_module
        } else {
            &self.false_next_module
        };
        branch.clone().ingest_entity(event.entity.clone(), event.time)
    }
}

impl ModuleNode for DecideTwoWayModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        Ok(vec![Event::new(t, "DecideTwoWayByCondition", entity, handler)])
    }
}
