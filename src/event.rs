//! Scheduled units of work.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::entity::{EntityId, FlowEntity};
use crate::error::EngineResult;
use crate::sys_var::SysVar;

/// A module's event handler: takes the event and the shared system state,
/// returns every event it schedules as a result.
pub type Handler = Rc<dyn Fn(&Event, &mut SysVar) -> EngineResult<Vec<Event>>>;

/// A unit of work scheduled at a point in simulated time.
#[derive(Clone)]
pub struct Event {
    pub time: f64,
    pub name: String,
    pub message: String,
    pub handler: Handler,
    pub entity: FlowEntity,
    /// Handler-specific payload: `delay_time`, `wait_time`, batch member
    /// lists, and similar.
    pub attr: Value,
}

impl Event {
    pub fn new(time: f64, name: impl Into<String>, entity: FlowEntity, handler: Handler) -> Self {
        Self {
            time,
            name: name.into(),
            message: String::new(),
            handler,
            entity,
            attr: Value::Null,
        }
    }

    pub fn with_attr(mut self, attr: Value) -> Self {
        self.attr = attr;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn entity_ind(&self) -> EntityId {
        self.entity.ind()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("time", &self.time)
            .field("name", &self.name)
            .field("entity", &self.entity.ind())
            .finish()
    }
}

// Events order by `(time, entity.ind)` ascending so the scheduler's
// `BinaryHeap<Reverse<Event>>` pops the earliest, lowest-ind event first.
// A bare time comparison (as in a single-stream simulation) would leave
// same-time events in arbitrary heap order; entity.ind breaks the tie
// deterministically because ids are assigned at construction time.
impl PartialEq for Event {
    fn eq(&self, other: &Event) -> bool {
        self.time == other.time && self.entity.ind() == other.entity.ind()
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Event) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Event) -> Ordering {
        match self.time.partial_cmp(&other.time) {
            Some(Ordering::Equal) | None => self.entity.ind().cmp(&other.entity.ind()),
            Some(o) => o,
        }
    }
}
