// hamming.rs - Substitution counts over aligned sequences

use anyhow::bail;
use bio::alignment::distance::hamming;

use super::traits::SequenceMetric;

fn check_lengths(a: &[u8], b: &[u8]) -> anyhow::Result<()> {
    if a.len() != b.len() {
        bail!(
            "sequences must have equal length for a Hamming distance ({} vs {})",
            a.len(),
            b.len()
        );
    }
    Ok(())
}

/// Number of mismatching positions
#[derive(Debug, Clone)]
pub struct Hamming;

impl SequenceMetric for Hamming {
    fn distance(&self, a: &[u8], b: &[u8]) -> anyhow::Result<f64> {
        check_lengths(a, b)?;
        Ok(hamming(a, b) as f64)
    }

    fn name(&self) -> &'static str {
        "Hamming"
    }

    fn description(&self) -> &'static str {
        "Mismatching positions between equal-length sequences"
    }

    fn requires_equal_length(&self) -> bool {
        true
    }
}

/// Proportion of mismatching positions (Hamming / length)
#[derive(Debug, Clone)]
pub struct PDistance;

impl SequenceMetric for PDistance {
    fn distance(&self, a: &[u8], b: &[u8]) -> anyhow::Result<f64> {
        check_lengths(a, b)?;
        if a.is_empty() {
            return Ok(0.0);
        }
        Ok(hamming(a, b) as f64 / a.len() as f64)
    }

    fn name(&self) -> &'static str {
        "p-distance"
    }

    fn description(&self) -> &'static str {
        "Fraction of mismatching positions between equal-length sequences"
    }

    fn requires_equal_length(&self) -> bool {
        true
    }
}
