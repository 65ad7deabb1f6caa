use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::entity::{BatchEntity, Entity, EntityIdGen, FlowEntity};
use crate::error::{EngineError, EngineResult};
use crate::event::{Event, Handler};
use crate::sys_var::SysVar;

use super::ModuleNode;

/// How a [`BatchModule`] decides which waiting entities an arrival matches.
pub enum BatchType {
    /// Matches `batch_size - 1` waiters whose `attr[key]` equals the
    /// arriving entity's.
    Attribute { key: String },
    /// Matches the `batch_size - 1` oldest waiters, regardless of attributes.
    Any,
}

/// Groups entities into a [`BatchEntity`] once enough matching waiters have
/// accumulated. Does not accept batch entities as input.
pub struct BatchModule {
    pub name: String,
    pub batch_type: BatchType,
    pub batch_size: usize,
    pub batch_entity_type: Option<String>,
    queue: RefCell<VecDeque<(Entity, f64)>>,
    id_gen: Rc<RefCell<EntityIdGen>>,
    successor: Rc<dyn ModuleNode>,
}

impl BatchModule {
    pub fn new(
        name: impl Into<String>,
        batch_type: BatchType,
        batch_size: usize,
        batch_entity_type: Option<String>,
        id_gen: Rc<RefCell<EntityIdGen>>,
        successor: Rc<dyn ModuleNode>,
    ) -> EngineResult<Rc<Self>> {
        let name = name.into();
        if matches!(&batch_type, BatchType::Attribute { key } if key.is_empty()) {
            return Err(EngineError::MissingBatchKey { module: name });
        }
        Ok(Rc::new(Self {
            name,
            batch_type,
            batch_size,
            batch_entity_type,
            queue: RefCell::new(VecDeque::new()),
            id_gen,
            successor,
        }))
    }

    fn try_match(&self, arriving: &Entity) -> Option<Vec<(Entity, f64)>> {
        let need = self.batch_size - 1;
        let mut queue = self.queue.borrow_mut();
        match &self.batch_type {
            BatchType::Any => {
                if queue.len() >= need {
                    Some((0..need).filter_map(|_| queue.pop_front()).collect())
                } else {
                    None
                }
            }
            BatchType::Attribute { key } => {
                let target = arriving.attr.get(key);
                let matched_idx: Vec<usize> = match target {
                    None => Vec::new(),
                    Some(target) => queue
                        .iter()
                        .enumerate()
                        .filter(|(_, (e, _))| e.attr.get(key) == Some(target))
                        .take(need)
                        .map(|(i, _)| i)
                        .collect(),
                };
                if matched_idx.len() < need {
                    return None;
                }
                let mut matched = Vec::with_capacity(need);
                for &i in matched_idx.iter().rev() {
                    matched.push(queue.remove(i).expect("index came from this queue"));
                }
                matched.reverse();
                Some(matched)
            }
        }
    }

    fn process_event(
        &self,
        event: &Event,
        members: &[(Entity, f64)],
        sys_var: &mut SysVar,
    ) -> EngineResult<Vec<Event>> {
        tracing::debug!(module = %self.name, time = event.time, size = members.len(), "process_event");
        let ind = self.id_gen.borrow_mut().next();
        let entity_type = self
            .batch_entity_type
            .clone()
            .unwrap_or_else(|| event.entity.entity_type().to_string());
        let constituents: Vec<Entity> = members.iter().map(|(e, _)| e.clone()).collect();
        let batch = BatchEntity::new(ind, entity_type, event.time, constituents);
        sys_var.init_entity(batch.ind, &batch.entity_type, event.time);

        for (constituent, entry_time) in members {
            if let Some(m) = sys_var.entity_metrics.get_mut(&constituent.ind) {
                m.wait_time += event.time - entry_time;
            }
            sys_var.trace(constituent.ind, format!("Exit {}", self.name), event.time);
        }

        self.successor
            .clone()
            .ingest_entity(FlowEntity::Batch(batch), event.time)
    }
}

impl ModuleNode for BatchModule {
    fn ingest_entity(self: Rc<Self>, entity: FlowEntity, t: f64) -> EngineResult<Vec<Event>> {
        let arriving = entity
            .as_single()
            .ok_or_else(|| EngineError::UnexpectedBatchEntity {
                module: self.name.clone(),
            })?
            .clone();

        match self.try_match(&arriving) {
            Some(matched) => {
                let mut members = vec![(arriving, t)];
                members.extend(matched);
                let module = Rc::clone(&self);
                let members_for_handler = members.clone();
                let handler: Handler = Rc::new(move |event, sys_var| {
                    module.process_event(event, &members_for_handler, sys_var)
                });
                Ok(vec![Event::new(t, "Batch", entity, handler)])
            }
            None => {
                self.queue.borrow_mut().push_back((arriving, t));
                Ok(vec![])
            }
        }
    }
}
