// mod.rs - Parallel engine: dispatch, builders, sweep and termination

pub mod dense;
pub mod dispatch;
pub mod error;
mod slots;
pub mod sparse;
pub mod sweep;
pub mod termination;

// Re-export main types for convenience
pub use dense::{dense_cross, dense_self, DistanceMatrix};
pub use dispatch::{
    is_worker_thread, worker_count, DispatchOptions, ProgressCallback, WorkCursor, DEFAULT_PROGRESS_EVERY,
    WORKER_THREAD_PREFIX,
};
pub use error::{EngineError, EngineResult, EvaluationError};
pub use sparse::{pair_count, sparse_self, triangular_offset, SparseMatrix};
pub use sweep::{parameter_sweep, round_robin, SweepPoint, SweepResult};
pub use termination::InterruptHandle;
