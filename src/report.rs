//! Derived, read-only views over a finished run: the flat per-entity
//! metrics table, the raw trace, and per-entity-type summary statistics.
//!
//! Mirrors the grouped mean/median/sum breakdown a host would print at the
//! end of a run, without this crate opinionating on presentation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::resource::Resource;
use crate::sys_var::{AggregateMetrics, EntityMetrics, SysVar};

/// Everything a host needs after a run: the raw state plus a couple of
/// convenience views computed on demand.
pub struct SimulationOutput {
    pub sys_var: SysVar,
    pub duration: f64,
}

impl SimulationOutput {
    pub fn from_sys_var(sys_var: SysVar, duration: f64) -> Self {
        Self { sys_var, duration }
    }

    pub fn metrics_table(&self) -> &HashMap<EntityId, EntityMetrics> {
        &self.sys_var.entity_metrics
    }

    pub fn trace(&self, ind: EntityId) -> Option<&[(String, f64)]> {
        self.sys_var.entity_trace.get(&ind).map(Vec::as_slice)
    }

    pub fn aggregates(&self) -> &AggregateMetrics {
        &self.sys_var.metrics
    }

    pub fn utilization_of(&self, resource: &Resource) -> f64 {
        resource.calc_utilization(self.duration)
    }

    /// Count/mean/median/sum of every numeric metrics column, grouped by
    /// `Entity Type`, excluding the `Created At` / `Disposed At` timestamp
    /// columns (as the original per-entity-type report does).
    pub fn entity_type_summary(&self) -> Vec<EntityTypeSummary> {
        let mut by_type: HashMap<String, Vec<&EntityMetrics>> = HashMap::new();
        for m in self.sys_var.entity_metrics.values() {
            by_type.entry(m.entity_type.clone()).or_default().push(m);
        }

        let mut summaries: Vec<EntityTypeSummary> = by_type
            .into_iter()
            .map(|(entity_type, rows)| EntityTypeSummary::from_rows(entity_type, &rows))
            .collect();
        summaries.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
        summaries
    }
}

/// Summary statistics for a single `Entity Type` column group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityTypeSummary {
    pub entity_type: String,
    pub count: usize,
    pub mean_time_in_system: Option<f64>,
    pub median_time_in_system: Option<f64>,
    pub sum_time_in_system: f64,
    pub mean_wait_time: f64,
    pub mean_value_added_time: f64,
}

impl EntityTypeSummary {
    fn from_rows(entity_type: String, rows: &[&EntityMetrics]) -> Self {
        let mut times: Vec<f64> = rows.iter().filter_map(|r| r.time_in_system()).collect();
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum_time_in_system: f64 = times.iter().sum();
        let mean_time_in_system = if times.is_empty() {
            None
        } else {
            Some(sum_time_in_system / times.len() as f64)
        };
        let median_time_in_system = median(&times);

        let n = rows.len().max(1) as f64;
        let mean_wait_time = rows.iter().map(|r| r.wait_time).sum::<f64>() / n;
        let mean_value_added_time = rows.iter().map(|r| r.value_added_time).sum::<f64>() / n;

        Self {
            entity_type,
            count: rows.len(),
            mean_time_in_system,
            median_time_in_system,
            sum_time_in_system,
            mean_wait_time,
            mean_value_added_time,
        }
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
