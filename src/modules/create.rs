use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::{Entity, EntityIdGen, FlowEntity};
use crate::error::EngineResult;
use crate::event::{Event, Handler};
use crate::streams::ArrivalStream;
use crate::sys_var::SysVar;

use super::ModuleNode;

/// Arrival source. Draws timestamps from an [`ArrivalStream`] over
/// `[first_arrival_time, horizon]` and creates `entities_per_arrival`
/// entities per timestamp, stopping early once `max_arrivals` timestamps
/// have been consumed (if set).
pub struct CreateModule {
    pub name: String,
    pub entity_type: String,
    pub first_arrival_time: f64,
    pub entities_per_arrival: usize,
    pub max_arrivals: Option<usize>,
    arrival_stream: RefCell<Box<dyn ArrivalStream>>,
    id_gen: Rc<RefCell<EntityIdGen>>,
    successor: Rc<dyn ModuleNode>,
}

impl CreateModule {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        arrival_stream: Box<dyn ArrivalStream>,
        first_arrival_time: f64,
        entities_per_arrival: usize,
        max_arrivals: Option<usize>,
        id_gen: Rc<RefCell<EntityIdGen>>,
        successor: Rc<dyn ModuleNode>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            entity_type: entity_type.into(),
            first_arrival_time,
            entities_per_arrival,
            max_arrivals,
            arrival_stream: RefCell::new(arrival_stream),
            id_gen,
            successor,
        })
    }

    /// Precomputes every arrival event up to `horizon`. Entity ids are
    /// assigned here, at precomputation time, which is what fixes the
    /// scheduler's tie-break order ahead of the run.
    pub fn generate_arrivals(self: &Rc<Self>, horizon: f64) -> EngineResult<Vec<Event>> {
        let timestamps = self
            .arrival_stream
            .borrow_mut()
            .generate(self.first_arrival_time, horizon);
        let limit = self.max_arrivals.unwrap_or(usize::MAX);

        let mut events = Vec::new();
        for t in timestamps.into_iter().take(limit) {
            for _ in 0..self.entities_per_arrival {
                let ind = self.id_gen.borrow_mut().next();
                let entity = Entity::new(ind, self.entity_type.clone(), t);
                tracing::debug!(module = %self.name, entity = ind.0, time = t, "arrival generated");
                let module = Rc::clone(self);
                let handler: Handler =
                    Rc::new(move |event, sys_var| module.process_event(event, sys_var));
                events.push(Event::new(t, "Create", FlowEntity::Single(entity), handler));
            }
        }
        Ok(events)
    }

    fn process_event(&self, event: &Event, sys_var: &mut SysVar) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, "process_event");
        let entity = event
            .entity
            .as_single()
            .expect("Create events always carry a single entity")
            .clone();
        sys_var.init_entity(entity.ind, &entity.entity_type, event.time);
        sys_var.trace(entity.ind, format!("Exit {}", self.name), event.time);
        self.successor
            .clone()
            .ingest_entity(FlowEntity::Single(entity), event.time)
    }
}
