// error.rs - Error taxonomy for the parallel engine

use thiserror::Error;

/// Errors that unwind a whole parallel call.
///
/// Any of these means "no usable output": builders never hand back a
/// partially filled buffer alongside an error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Shape or option validation failed before any worker was spawned.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A distance or evaluator call failed (or panicked) inside a worker.
    #[error("Worker {worker} failed on index {index}: {reason}")]
    WorkerFailure {
        worker: usize,
        index: usize,
        reason: String,
    },

    /// The interrupt handle was triggered while workers were running.
    #[error("Execution interrupted")]
    Interrupted,

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl EngineError {
    pub fn is_worker_failure(&self) -> bool {
        matches!(self, EngineError::WorkerFailure { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, EngineError::Interrupted)
    }

    pub(crate) fn worker_failure(worker: usize, index: usize, err: &anyhow::Error) -> Self {
        EngineError::WorkerFailure {
            worker,
            index,
            reason: format!("{:#}", err),
        }
    }
}

/// Outcome of a single sweep evaluation that did not produce a point.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// The cut collapsed to a single cluster, so the quality score is
    /// undefined. The sweep records `x` with a neutral score of 0.
    #[error("Degenerate evaluation at x = {x}")]
    Degenerate { x: f64 },

    /// Anything else; fatal to the sweep.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Result type alias for engine calls
pub type EngineResult<T> = Result<T, EngineError>;
