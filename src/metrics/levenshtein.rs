// levenshtein.rs - Edit distances for sequences of any length

use bio::alignment::distance::levenshtein;

use super::traits::SequenceMetric;

/// Minimum number of single-symbol insertions, deletions and substitutions
#[derive(Debug, Clone)]
pub struct Levenshtein;

impl SequenceMetric for Levenshtein {
    fn distance(&self, a: &[u8], b: &[u8]) -> anyhow::Result<f64> {
        Ok(f64::from(levenshtein(a, b)))
    }

    fn name(&self) -> &'static str {
        "Levenshtein"
    }

    fn description(&self) -> &'static str {
        "Edit distance (insertions, deletions, substitutions)"
    }
}

/// Edit distance divided by the longer sequence length
#[derive(Debug, Clone)]
pub struct NormalizedLevenshtein;

impl SequenceMetric for NormalizedLevenshtein {
    fn distance(&self, a: &[u8], b: &[u8]) -> anyhow::Result<f64> {
        let longest = a.len().max(b.len());
        if longest == 0 {
            return Ok(0.0);
        }
        Ok(f64::from(levenshtein(a, b)) / longest as f64)
    }

    fn name(&self) -> &'static str {
        "normalized Levenshtein"
    }

    fn description(&self) -> &'static str {
        "Edit distance scaled to [0, 1] by the longer sequence"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(Levenshtein.distance(b"kitten", b"sitting").unwrap(), 3.0);
        assert_eq!(Levenshtein.distance(b"", b"ACG").unwrap(), 3.0);
        assert_eq!(Levenshtein.distance(b"ACGT", b"ACGT").unwrap(), 0.0);
    }

    #[test]
    fn test_normalized_levenshtein() {
        assert_eq!(NormalizedLevenshtein.distance(b"ACGT", b"ACG").unwrap(), 0.25);
        assert_eq!(NormalizedLevenshtein.distance(b"", b"").unwrap(), 0.0);
        assert_eq!(NormalizedLevenshtein.distance(b"AAAA", b"TTTT").unwrap(), 1.0);
        assert!(!NormalizedLevenshtein.requires_equal_length());
    }
}
