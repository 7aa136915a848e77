// traits.rs - Core trait for pairwise sequence metrics

use std::fmt::Debug;

/// Pluggable pairwise distance between two byte sequences.
///
/// Implementations must be pure: the engine calls them concurrently from
/// every worker and in no particular order.
pub trait SequenceMetric: Send + Sync + Debug {
    /// Distance between two sequences
    fn distance(&self, a: &[u8], b: &[u8]) -> anyhow::Result<f64>;

    /// Get a human-readable name for this metric
    fn name(&self) -> &'static str;

    /// Get a description of this metric
    fn description(&self) -> &'static str;

    /// Whether both sequences must have the same length
    fn requires_equal_length(&self) -> bool {
        false
    }
}
