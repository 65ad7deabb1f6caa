use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::entity::FlowEntity;
use crate::error::EngineResult;
use crate::event::{Event, Handler};
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Where an [`Assignment`]'s computed value is written.
pub enum AssignTarget {
    /// Writes into `sys_var.variables[name]`.
    Variable,
    /// Writes into the entity's (or batch entity's) `attr[name]`.
    Attribute,
    /// Overwrites the entity's (or batch entity's) `entity_type`. The
    /// computed value is ignored; `name` is used directly as the new type.
    EntityType,
}

/// One `(target, name, value_fn)` triple. `value_fn` receives the current
/// global variables and the entity's own attribute map and computes the
/// value to write; evaluated exactly once per entity per `Assign` event.
pub struct Assignment {
    pub target: AssignTarget,
    pub name: String,
    pub value_fn: Rc<dyn Fn(&HashMap<String, Value>, &HashMap<String, Value>) -> Value>,
}

impl Assignment {
    pub fn variable(
        name: impl Into<String>,
        value_fn: Rc<dyn Fn(&HashMap<String, Value>, &HashMap<String, Value>) -> Value>,
    ) -> Self {
        Self {
            target: AssignTarget::Variable,
            name: name.into(),
            value_fn,
        }
    }

    pub fn attribute(
        name: impl Into<String>,
        value_fn: Rc<dyn Fn(&HashMap<String, Value>, &HashMap<String, Value>) -> Value>,
    ) -> Self {
        Self {
            target: AssignTarget::Attribute,
            name: name.into(),
            value_fn,
        }
    }

    pub fn entity_type(new_type: impl Into<String>) -> Self {
        Self {
            target: AssignTarget::EntityType,
            name: new_type.into(),
            value_fn: Rc::new(|_, _| Value::Null),
        }
    }
}

/// Evaluates a sequence of assignments in order, each able to observe the
/// writes of the ones before it.
pub struct AssignModule {
    pub name: String,
    assignments: Vec<Assignment>,
    successor: Rc<dyn ModuleNode>,
}

impl AssignModule {
    pub fn new(
        name: impl Into<String>,
        assignments: Vec<Assignment>,
        successor: Rc<dyn ModuleNode>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            assignments,
            successor,
        })
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        let mut entity = event.entity.clone();
        for assignment in &self.assignments {
            let value = (assignment.value_fn)(&sys_var.variables, entity.attr());
            match assignment.target {
                AssignTarget::Variable => {
                    sys_var.variables.insert(assignment.name.clone(), value);
                }
                AssignTarget::Attribute => {
                    entity.attr_mut().insert(assignment.name.clone(), value);
                }
                AssignTarget::EntityType => {
                    entity.set_entity_type(assignment.name.clone());
                }
            }
        }
        for ind in entity.constituent_inds() {
            sys_var.trace(ind, format!("Exit {}", self.name), event.time);
        }
        self.successor.clone().ingest_entity(entity, event.time)
    }
}

impl ModuleNode for AssignModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let module = Rc::clone(&self);
        let handler: Handler = Rc::new(move |event, sys_var| module.process_event(event, sys_var));
        Ok(vec![Event::new(t, "Assign", entity, handler)])
    }
}
