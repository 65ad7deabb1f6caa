//! Time-value streams: the engine's only input for inter-arrival gaps and
//! delay samples. The engine treats these as opaque; it has no notion of a
//! probability distribution. Distribution-backed generators (exponential,
//! triangular, uniform, ...) are example/demo material, not part of the core.

/// Produces every arrival timestamp in `[start, end]`, in ascending order.
/// Must be finite: `generate(start, end)` is expected to enumerate all of
/// them up front rather than being pulled lazily.
pub trait ArrivalStream {
    fn generate(&mut self, start: f64, end: f64) -> Vec<f64>;
}

/// Produces one non-negative delay sample per call. May be infinite; an
/// implementation backed by a finite sequence should return `None` once
/// exhausted so the caller can surface [`EngineError::StreamExhausted`](crate::error::EngineError::StreamExhausted).
pub trait DelayStream {
    fn next_delay(&mut self) -> Option<f64>;
}

/// An arrival stream that replays a fixed, pre-recorded sequence of
/// timestamps, ignoring anything past `end`. Useful for deterministic tests.
pub struct FixedArrivals(pub Vec<f64>);

impl ArrivalStream for FixedArrivals {
    fn generate(&mut self, start: f64, end: f64) -> Vec<f64> {
        self.0
            .iter()
            .copied()
            .filter(|&t| t >= start && t <= end)
            .collect()
    }
}

/// A delay stream that replays a fixed sequence, then reports exhaustion.
pub struct FixedDelays {
    values: Vec<f64>,
    next: usize,
}

impl FixedDelays {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, next: 0 }
    }
}

impl DelayStream for FixedDelays {
    fn next_delay(&mut self) -> Option<f64> {
        let v = self.values.get(self.next).copied();
        self.next += 1;
        v
    }
}

/// A delay stream that always yields the same constant.
pub struct ConstantDelay(pub f64);

impl DelayStream for ConstantDelay {
    fn next_delay(&mut self) -> Option<f64> {
        Some(self.0)
    }
}
