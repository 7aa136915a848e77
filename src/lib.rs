// lib.rs - pairdist library root

//! # pairdist - Parallel pairwise distance matrices and parameter sweeps
//!
//! The engine fills distance matrices from any pure pairwise function by
//! splitting the work across a pool of worker threads. Each output slot has
//! exactly one writer, so workers never lock on the hot path.
//!
//! ## Features
//!
//! - **Dense builders**: full symmetric self-distance and rectangular cross-distance matrices
//! - **Sparse builder**: strictly positive self-distances in CSR form
//! - **Parameter sweeps**: parallel evaluation of a scoring function over a parameter list
//! - **Clean termination**: the first failing call cancels its siblings and surfaces one error
//! - **Interrupts**: a shared handle (wired to SIGINT/SIGTERM by the binary) stops every worker
//! - **Silhouette sweeps**: score cuts of an external clustering at many thresholds
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use pairdist::prelude::*;
//!
//! let seqs: Vec<&[u8]> = vec![&b"ACGT"[..], &b"ACGA"[..], &b"TTGA"[..]];
//! let metric = Levenshtein;
//!
//! let matrix = dense_self(
//!     &seqs,
//!     |a, b| metric.distance(a, b),
//!     &DispatchOptions::default().with_workers(4),
//! )?;
//! assert_eq!(matrix.shape(), (3, 3));
//! # Ok::<(), EngineError>(())
//! ```

pub mod cli;
pub mod core;
pub mod data;
pub mod metrics;
pub mod output;
pub mod quality;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::core::{dense_cross, dense_self, parameter_sweep, sparse_self};
    pub use crate::core::{
        DispatchOptions, DistanceMatrix, EngineError, EngineResult, EvaluationError, InterruptHandle,
        SparseMatrix, SweepPoint, SweepResult,
    };
    pub use crate::data::{load_sequences, SequenceRecord};
    pub use crate::metrics::{Hamming, Levenshtein, MetricRegistry, NormalizedLevenshtein, PDistance, SequenceMetric};
    pub use crate::output::{write_matrix, write_sparse, OutputFormat};
    pub use crate::quality::{silhouette_score, silhouette_sweep, Partitioner, SweepAxis};
}

// Re-export main types at the root level for convenience
pub use crate::core::{DispatchOptions, DistanceMatrix, EngineError, InterruptHandle, SparseMatrix, SweepResult};
pub use crate::metrics::{MetricRegistry, SequenceMetric};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!("pairdist v{} - Parallel pairwise distance engine", VERSION)
}
