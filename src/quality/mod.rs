// Clustering quality sweeps built on the parallel sweep engine

pub mod grid;
pub mod partition;
pub mod silhouette;

pub use grid::{cluster_grid, cut_height_grid, linspace, percentile, threshold_grid, CutHeights};
pub use partition::{silhouette_evaluator, silhouette_sweep, Partitioner, SweepAxis, SweepParameter};
pub use silhouette::{count_clusters, silhouette_samples, silhouette_score, QualityError};
