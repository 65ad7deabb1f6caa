//! The ten module kinds entities flow through: arrival sources, resource
//! seize/delay/release, attribute assignment, duplication, batching and
//! separation, two-way branching, and disposal sinks.

use std::rc::Rc;

use crate::entity::FlowEntity;
use crate::error::EngineResult;
use crate::event::Event;

pub mod assign;
pub mod batch;
pub mod create;
pub mod decide;
pub mod delay;
pub mod dispose;
pub mod duplicate;
pub mod release;
pub mod seize;
pub mod separate;

pub use assign::{AssignModule, AssignTarget};
pub use batch::{BatchModule, BatchType};
pub use create::CreateModule;
pub use decide::DecideTwoWayModule;
pub use delay::{CostAllocation, DelayModule};
pub use dispose::DisposeModule;
pub use duplicate::DuplicateModule;
pub use release::ReleaseModule;
pub use seize::SeizeModule;
pub use separate::SeparateModule;

/// The one way an upstream module hands an entity to whatever comes next.
/// Every module kind implements this over its successor reference(s); the
/// graph it forms is a DAG, not a tree, since a `DuplicateModule`'s two
/// branches may rendezvous at a shared `BatchModule`.
pub trait ModuleNode {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>>;
}
