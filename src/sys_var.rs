//! The system-state record threaded through every module handler.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityId;

/// One row of the stable per-entity-metrics schema (`EXTERNAL INTERFACES`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMetrics {
    pub entity_type: String,
    pub created_at: Option<f64>,
    pub disposed_at: Option<f64>,
    pub value_added_time: f64,
    pub non_value_added_time: f64,
    pub wait_time: f64,
    pub transfer_time: f64,
    pub other_time: f64,
}

impl EntityMetrics {
    pub fn new(entity_type: impl Into<String>, created_at: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            created_at: Some(created_at),
            ..Default::default()
        }
    }

    /// `Disposed At - Created At`, or `None` if the entity never disposed.
    pub fn time_in_system(&self) -> Option<f64> {
        match (self.created_at, self.disposed_at) {
            (Some(c), Some(d)) => Some(d - c),
            _ => None,
        }
    }

    pub fn add(&mut self, allocation: crate::modules::CostAllocation, amount: f64) {
        use crate::modules::CostAllocation::*;
        match allocation {
            ValueAdded => self.value_added_time += amount,
            NonValueAdded => self.non_value_added_time += amount,
            Wait => self.wait_time += amount,
            Transfer => self.transfer_time += amount,
            Other => self.other_time += amount,
        }
    }
}

/// Aggregate, run-wide outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub total_entity_system_time: f64,
    pub average_entity_system_time: f64,
}

/// The mutable state threaded by `&mut` reference to every module handler.
#[derive(Debug, Default)]
pub struct SysVar {
    pub entity_metrics: HashMap<EntityId, EntityMetrics>,
    pub entity_trace: HashMap<EntityId, Vec<(String, f64)>>,
    pub variables: HashMap<String, Value>,
    pub metrics: AggregateMetrics,
}

impl SysVar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initializes the metrics/trace records for a freshly created entity.
    pub fn init_entity(&mut self, ind: EntityId, entity_type: &str, t: f64) {
        self.entity_metrics
            .insert(ind, EntityMetrics::new(entity_type, t));
        self.entity_trace.entry(ind).or_default();
    }

    pub fn trace(&mut self, ind: EntityId, label: impl Into<String>, t: f64) {
        self.entity_trace.entry(ind).or_default().push((label.into(), t));
    }

    pub fn dispose(&mut self, ind: EntityId, t: f64) {
        if let Some(m) = self.entity_metrics.get_mut(&ind) {
            m.disposed_at = Some(t);
        }
    }

    /// Recomputes `metrics.total_entity_system_time` /
    /// `average_entity_system_time` over every entity that has disposed.
    pub fn finalize_aggregates(&mut self) {
        let times: Vec<f64> = self
            .entity_metrics
            .values()
            .filter_map(|m| m.time_in_system())
            .collect();
        let total: f64 = times.iter().sum();
        let avg = if times.is_empty() {
            0.0
        } else {
            total / times.len() as f64
        };
        self.metrics.total_entity_system_time = total;
        self.metrics.average_entity_system_time = avg;
    }
}
