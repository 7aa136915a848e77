// registry.rs - Metric registry for managing available distances

use std::collections::BTreeMap;

use super::traits::SequenceMetric;
use super::{Hamming, Levenshtein, NormalizedLevenshtein, PDistance};

/// Registry of named sequence metrics
pub struct MetricRegistry {
    metrics: BTreeMap<String, Box<dyn SequenceMetric>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            metrics: BTreeMap::new(),
        };

        registry.register("hamming", Box::new(Hamming));
        registry.register("p-distance", Box::new(PDistance));
        registry.register("levenshtein", Box::new(Levenshtein));
        registry.register("normalized-levenshtein", Box::new(NormalizedLevenshtein));

        registry
    }

    /// Register a new metric, replacing any metric with the same name
    pub fn register(&mut self, name: &str, metric: Box<dyn SequenceMetric>) {
        self.metrics.insert(name.to_string(), metric);
    }

    pub fn get(&self, name: &str) -> Option<&dyn SequenceMetric> {
        self.metrics.get(name).map(|m| m.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    /// `(registered name, description)` in name order
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.metrics
            .iter()
            .map(|(name, m)| (name.as_str(), m.description()))
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.metrics.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
