//! Shared, capacity-bounded resources with FIFO-per-release waiting queues.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::entity::FlowEntity;
use crate::error::{EngineError, EngineResult};
use crate::event::Handler;

/// An entity parked on a resource's queue, waiting for enough capacity to
/// free up. Ordered by `(entry_time, demand, entity.ind)` so earlier and
/// smaller requests are served first.
pub struct Waiter {
    pub entity: FlowEntity,
    pub demand: usize,
    pub entry_time: f64,
    pub handler: Handler,
}

impl PartialEq for Waiter {
    fn eq(&self, other: &Self) -> bool {
        self.entry_time == other.entry_time
            && self.demand == other.demand
            && self.entity.ind() == other.entity.ind()
    }
}
impl Eq for Waiter {}

impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Waiter {
    // Reversed so a `BinaryHeap` (max-heap) pops the earliest waiter first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .entry_time
            .partial_cmp(&self.entry_time)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.demand.cmp(&self.demand))
            .then_with(|| other.entity.ind().cmp(&self.entity.ind()))
    }
}

/// A capacity-bounded resource: seize decreases `available`, release
/// increases it and may immediately wake the head of the waiting queue.
pub struct Resource {
    pub name: String,
    pub capacity: usize,
    available: usize,
    queue: BinaryHeap<Waiter>,
    /// `(time, available)` samples, one appended on every seize and release.
    availability_log: Vec<(f64, usize)>,
}

/// The result of a release: the release itself always "happens"; it may
/// additionally wake a single waiter, which the caller turns into a
/// synthesized seize event.
pub struct Woken {
    pub entity: FlowEntity,
    pub handler: Handler,
    pub wait_time: f64,
}

impl Resource {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            available: capacity,
            queue: BinaryHeap::new(),
            availability_log: vec![(0.0, capacity)],
        }
    }

    pub fn available(&self) -> usize {
        self.available
    }

    pub fn has_capacity(&self, demand: usize) -> bool {
        self.available >= demand
    }

    /// Unconditionally decrements `available`; callers must have already
    /// checked `has_capacity`.
    pub fn seize(&mut self, demand: usize, t: f64) -> EngineResult<()> {
        if demand > self.available {
            return Err(EngineError::OverSeize {
                resource: self.name.clone(),
                amount: demand,
                available: self.available,
            });
        }
        self.available -= demand;
        self.availability_log.push((t, self.available));
        Ok(())
    }

    pub fn queue_entity(&mut self, entity: FlowEntity, demand: usize, t: f64, handler: Handler) {
        self.queue.push(Waiter {
            entity,
            demand,
            entry_time: t,
            handler,
        });
    }

    /// Releases `demand` units and, if the queue's head now fits, seizes for
    /// it immediately and returns the waiter that was woken.
    pub fn release(&mut self, demand: usize, t: f64) -> EngineResult<Option<Woken>> {
        let seized = self.capacity - self.available;
        if demand > seized {
            return Err(EngineError::OverRelease {
                resource: self.name.clone(),
                amount: demand,
                seized,
            });
        }
        self.available += demand;
        self.availability_log.push((t, self.available));

        if let Some(head) = self.queue.peek() {
            if head.demand <= self.available {
                let head = self.queue.pop().expect("peeked head must exist");
                self.seize(head.demand, t)?;
                return Ok(Some(Woken {
                    entity: head.entity,
                    handler: head.handler,
                    wait_time: t - head.entry_time,
                }));
            }
        }
        Ok(None)
    }

    /// Fraction of `capacity * duration` spent seized, integrating the
    /// busy-time step function defined by the availability log.
    pub fn calc_utilization(&self, duration: f64) -> f64 {
        if duration <= 0.0 || self.capacity == 0 {
            return 0.0;
        }
        let mut busy_time = 0.0;
        for window in self.availability_log.windows(2) {
            let (t1, a1) = window[0];
            let (t2, _) = window[1];
            busy_time += (t2 - t1) * (self.capacity - a1) as f64;
        }
        if let Some(&(last_t, last_a)) = self.availability_log.last() {
            if last_t < duration {
                busy_time += (duration - last_t) * (self.capacity - last_a) as f64;
            }
        }
        busy_time / (self.capacity as f64 * duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, EntityId};

    fn single(ind: u64) -> FlowEntity {
        FlowEntity::Single(Entity::new(EntityId(ind), "widget", 0.0))
    }

    #[test]
    fn seize_then_release_restores_availability() {
        let mut r = Resource::new("r", 2);
        r.seize(2, 0.0).unwrap();
        assert_eq!(r.available(), 0);
        let woken = r.release(2, 1.0).unwrap();
        assert!(woken.is_none());
        assert_eq!(r.available(), 2);
    }

    #[test]
    fn release_wakes_queued_seize() {
        let mut r = Resource::new("r", 1);
        r.seize(1, 0.0).unwrap();
        let noop: Handler = std::rc::Rc::new(|_, _| Ok(vec![]));
        r.queue_entity(single(1), 1, 0.0, noop);
        let woken = r.release(1, 5.0).unwrap().expect("should wake the waiter");
        assert_eq!(woken.entity.ind(), EntityId(1));
        assert_eq!(woken.wait_time, 5.0);
        assert_eq!(r.available(), 0);
    }

    #[test]
    fn utilization_is_busy_time_fraction() {
        let mut r = Resource::new("r", 1);
        r.seize(1, 0.0).unwrap();
        r.release(1, 6.0).unwrap();
        assert!((r.calc_utilization(20.0) - 0.30).abs() < 1e-9);
    }
}
