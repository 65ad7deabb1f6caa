//! Error types for the simulation engine

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal conditions the engine can encounter. None of these are recoverable:
/// a simulation that hits one stops, since the scheduler has no retry or
/// partial-recovery path.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A release tried to free more capacity than is currently seized.
    #[error("resource {resource}: cannot release {amount} units, only {seized} seized")]
    OverRelease {
        resource: String,
        amount: usize,
        seized: usize,
    },

    /// A seize was attempted against a precondition violation (internal
    /// bookkeeping bug, since `SeizeModule` always queues rather than
    /// seizing past capacity).
    #[error("resource {resource}: cannot seize {amount} units, only {available} available")]
    OverSeize {
        resource: String,
        amount: usize,
        available: usize,
    },

    /// A `BatchEntity` was routed into a module that only accepts plain entities.
    #[error("module {module}: batch entities are not accepted here")]
    UnexpectedBatchEntity { module: String },

    /// A plain entity was routed into `SeparateModule`, which only accepts batches.
    #[error("module {module}: expected a batch entity to separate")]
    ExpectedBatchEntity { module: String },

    /// `BatchModule` was configured with `BatchType::Attribute` but no key.
    #[error("batch module {module}: attribute batching requires a batch key")]
    MissingBatchKey { module: String },

    /// A delay or arrival stream was pulled past the values it can produce.
    #[error("stream exhausted while sampling {context}")]
    StreamExhausted { context: String },
}
