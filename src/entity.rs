//! Entities flowing through the module graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Process-unique, strictly increasing entity identifier.
///
/// Assigned at construction time (arrival precomputation, duplication, or
/// batch formation), so two entities created in the same call always
/// compare in creation order — this is what gives the scheduler's tie-break
/// its determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Monotonic counter handed out by an [`Environment`](crate::environment::Environment).
#[derive(Debug, Default)]
pub struct EntityIdGen(u64);

impl EntityIdGen {
    pub fn next(&mut self) -> EntityId {
        let id = EntityId(self.0);
        self.0 += 1;
        id
    }
}

/// A discrete token flowing through the module graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub ind: EntityId,
    pub entity_type: String,
    pub arrival_time: f64,
    pub attr: HashMap<String, serde_json::Value>,
    /// Shared across a Duplicate's original/copy pair; `None` for entities
    /// that have never passed through a `DuplicateModule`.
    pub serial: Option<u64>,
}

impl Entity {
    pub fn new(ind: EntityId, entity_type: impl Into<String>, arrival_time: f64) -> Self {
        Self {
            ind,
            entity_type: entity_type.into(),
            arrival_time,
            attr: HashMap::new(),
            serial: None,
        }
    }

    /// Deep-copies `attr` rather than sharing it, so a later `AssignModule`
    /// on one branch cannot retroactively mutate the other.
    pub fn duplicate(&self, new_ind: EntityId, t: f64) -> Self {
        Self {
            ind: new_ind,
            entity_type: self.entity_type.clone(),
            arrival_time: t,
            attr: self.attr.clone(),
            serial: Some(self.serial.unwrap_or(self.ind.0)),
        }
    }
}

/// A composite entity formed by a `BatchModule`. First-class for metric
/// purposes: it carries its own `ind`, trace, and metrics record, while its
/// constituents keep theirs so a `SeparateModule` can hand them back intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntity {
    pub ind: EntityId,
    pub entity_type: String,
    pub arrival_time: f64,
    pub attr: HashMap<String, serde_json::Value>,
    pub batched_entities: Vec<Entity>,
}

impl BatchEntity {
    pub fn new(ind: EntityId, entity_type: impl Into<String>, t: f64, members: Vec<Entity>) -> Self {
        Self {
            ind,
            entity_type: entity_type.into(),
            arrival_time: t,
            attr: HashMap::new(),
            batched_entities: members,
        }
    }
}

/// Either a plain entity or a batch, as carried by an in-flight event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FlowEntity {
    Single(Entity),
    Batch(BatchEntity),
}

impl FlowEntity {
    pub fn ind(&self) -> EntityId {
        match self {
            FlowEntity::Single(e) => e.ind,
            FlowEntity::Batch(b) => b.ind,
        }
    }

    pub fn entity_type(&self) -> &str {
        match self {
            FlowEntity::Single(e) => &e.entity_type,
            FlowEntity::Batch(b) => &b.entity_type,
        }
    }

    pub fn as_single(&self) -> Option<&Entity> {
        match self {
            FlowEntity::Single(e) => Some(e),
            FlowEntity::Batch(_) => None,
        }
    }

    pub fn as_single_mut(&mut self) -> Option<&mut Entity> {
        match self {
            FlowEntity::Single(e) => Some(e),
            FlowEntity::Batch(_) => None,
        }
    }

    pub fn as_batch(&self) -> Option<&BatchEntity> {
        match self {
            FlowEntity::Batch(b) => Some(b),
            FlowEntity::Single(_) => None,
        }
    }

    pub fn as_batch_mut(&mut self) -> Option<&mut BatchEntity> {
        match self {
            FlowEntity::Batch(b) => Some(b),
            FlowEntity::Single(_) => None,
        }
    }

    pub fn attr(&self) -> &HashMap<String, serde_json::Value> {
        match self {
            FlowEntity::Single(e) => &e.attr,
            FlowEntity::Batch(b) => &b.attr,
        }
    }

    pub fn attr_mut(&mut self) -> &mut HashMap<String, serde_json::Value> {
        match self {
            FlowEntity::Single(e) => &mut e.attr,
            FlowEntity::Batch(b) => &mut b.attr,
        }
    }

    pub fn set_entity_type(&mut self, new_type: String) {
        match self {
            FlowEntity::Single(e) => e.entity_type = new_type,
            FlowEntity::Batch(b) => b.entity_type = new_type,
        }
    }

    /// Every individually-metered entity this flow entity stands for: itself
    /// if plain, or the batch entity itself plus every constituent if a
    /// batch — mirroring `original_source/modules.py`'s unconditional update
    /// of the top-level entity with an additional pass over
    /// `batched_entities` when it is a `BatchEntity`.
    pub fn constituent_inds(&self) -> Vec<EntityId> {
        match self {
            FlowEntity::Single(e) => vec![e.ind],
            FlowEntity::Batch(b) => {
                let mut inds = Vec::with_capacity(b.batched_entities.len() + 1);
                inds.push(b.ind);
                inds.extend(b.batched_entities.iter().map(|c| c.ind));
                inds
            }
        }
    }
}
