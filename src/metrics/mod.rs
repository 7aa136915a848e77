// mod.rs - Sequence metrics module root

pub mod hamming;
pub mod levenshtein;
pub mod registry;
pub mod traits;

pub use hamming::{Hamming, PDistance};
pub use levenshtein::{Levenshtein, NormalizedLevenshtein};
pub use registry::MetricRegistry;
pub use traits::SequenceMetric;
