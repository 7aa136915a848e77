// partition.rs - Silhouette sweeps over externally built cluster structures

use std::fmt;
use std::str::FromStr;

use anyhow::Context;

use crate::core::{
    parameter_sweep, DispatchOptions, DistanceMatrix, EngineError, EngineResult, EvaluationError,
    SweepPoint, SweepResult,
};
use crate::quality::silhouette::{count_clusters, silhouette_score, QualityError};

/// Cuts an opaque clustering structure (a linkage tree, a spectral
/// affinity model, ...) into flat labels at a given parameter.
///
/// Building the structure is the caller's business; the sweep only asks for
/// one partition per parameter.
pub trait Partitioner<P>: Sync {
    fn partition(&self, parameter: &P) -> anyhow::Result<Vec<usize>>;
}

impl<P, F> Partitioner<P> for F
where
    F: Fn(&P) -> anyhow::Result<Vec<usize>> + Sync,
{
    fn partition(&self, parameter: &P) -> anyhow::Result<Vec<usize>> {
        self(parameter)
    }
}

/// Numeric view of a sweep parameter (cut height or cluster count)
pub trait SweepParameter: Sync {
    fn value(&self) -> f64;
}

impl SweepParameter for f64 {
    fn value(&self) -> f64 {
        *self
    }
}

impl SweepParameter for f32 {
    fn value(&self) -> f64 {
        f64::from(*self)
    }
}

impl SweepParameter for usize {
    fn value(&self) -> f64 {
        *self as f64
    }
}

impl SweepParameter for u32 {
    fn value(&self) -> f64 {
        f64::from(*self)
    }
}

/// What goes on the x axis of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepAxis {
    /// Number of clusters the cut produced
    #[default]
    Clusters,
    /// The parameter itself (cut height, requested cluster count)
    Parameter,
}

impl FromStr for SweepAxis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clusters" => Ok(SweepAxis::Clusters),
            "parameter" | "thresholds" | "threshold" => Ok(SweepAxis::Parameter),
            _ => Err(format!(
                "Unknown sweep axis: {}. Use: clusters, parameter",
                s
            )),
        }
    }
}

impl fmt::Display for SweepAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepAxis::Clusters => write!(f, "clusters"),
            SweepAxis::Parameter => write!(f, "parameter"),
        }
    }
}

/// Evaluator scoring one partition with the mean silhouette.
///
/// A single-cluster cut is reported as degenerate (x = 1 cluster, or the
/// parameter on the [`SweepAxis::Parameter`] axis).
pub fn silhouette_evaluator<'a, P, Q>(
    dist: &'a DistanceMatrix,
    partitioner: &'a Q,
    axis: SweepAxis,
) -> impl Fn(&P) -> Result<SweepPoint, EvaluationError> + Sync + 'a
where
    P: SweepParameter,
    Q: Partitioner<P>,
{
    move |parameter: &P| {
        let labels = partitioner
            .partition(parameter)
            .with_context(|| format!("partition at {}", parameter.value()))?;

        let x = match axis {
            SweepAxis::Clusters => count_clusters(&labels) as f64,
            SweepAxis::Parameter => parameter.value(),
        };
        match silhouette_score(dist, &labels) {
            Ok(y) => Ok(SweepPoint::new(x, y)),
            Err(QualityError::SingleCluster(_)) => Err(EvaluationError::Degenerate {
                x: match axis {
                    SweepAxis::Clusters => 1.0,
                    SweepAxis::Parameter => parameter.value(),
                },
            }),
            Err(e) => Err(EvaluationError::Failed(
                anyhow::Error::new(e).context(format!("silhouette at {}", parameter.value())),
            )),
        }
    }
}

/// Mean silhouette for every parameter, evaluated in parallel.
pub fn silhouette_sweep<P, Q>(
    dist: &DistanceMatrix,
    partitioner: &Q,
    params: &[P],
    axis: SweepAxis,
    options: &DispatchOptions,
) -> EngineResult<SweepResult>
where
    P: SweepParameter,
    Q: Partitioner<P>,
{
    if !dist.is_square() {
        return Err(EngineError::InvalidInput(format!(
            "silhouette sweep needs a square distance matrix, got {} x {}",
            dist.rows(),
            dist.cols()
        )));
    }
    parameter_sweep(params, silhouette_evaluator(dist, partitioner, axis), options)
}
