//! Discrete-event simulation engine for process models expressed as
//! directed module graphs.
//!
//! Entities enter at arrival sources, flow synchronously through a graph
//! of modules (seize/delay/release, assign, duplicate, batch/separate,
//! two-way conditional branching) and are disposed at sinks. A single
//! time-ordered event queue drives the whole run; there is no threading,
//! no real-time pacing, and no distributed coordination.

pub mod entity;
pub mod environment;
pub mod error;
pub mod event;
pub mod modules;
pub mod report;
pub mod resource;
pub mod streams;
pub mod sys_var;

pub use entity::{BatchEntity, Entity, EntityId};
pub use environment::Environment;
pub use error::{EngineError, EngineResult};
pub use event::Event;
pub use modules::{
    AssignModule, AssignTarget, BatchModule, BatchType, CostAllocation, CreateModule,
    DecideTwoWayModule, DelayModule, DisposeModule, DuplicateModule, ModuleNode, ReleaseModule,
    SeizeModule, SeparateModule,
};
pub use report::{EntityTypeSummary, SimulationOutput};
pub use resource::Resource;
pub use streams::{ArrivalStream, DelayStream};
pub use sys_var::SysVar;
