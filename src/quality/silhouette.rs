// silhouette.rs - Silhouette coefficients over a precomputed distance matrix

use std::collections::HashMap;

use thiserror::Error;

use crate::core::DistanceMatrix;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityError {
    /// Fewer than two clusters: the silhouette is undefined.
    #[error("silhouette needs at least 2 clusters, found {0}")]
    SingleCluster(usize),

    #[error("{clusters} clusters for {samples} samples; silhouette needs between 2 and n - 1")]
    TooManyClusters { clusters: usize, samples: usize },

    #[error("{labels} labels for {samples} samples")]
    LabelCount { labels: usize, samples: usize },

    #[error("distance matrix must be square, got {rows} x {cols}")]
    NotSquare { rows: usize, cols: usize },
}

/// Number of distinct labels
pub fn count_clusters(labels: &[usize]) -> usize {
    let mut seen: Vec<usize> = labels.to_vec();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// Per-sample silhouette coefficient.
///
/// `a` is the mean distance to the other members of the sample's cluster,
/// `b` the smallest mean distance to any other cluster, and the score is
/// `(b - a) / max(a, b)`. Members of singleton clusters score 0, as does
/// any sample with `a == b == 0`.
pub fn silhouette_samples(dist: &DistanceMatrix, labels: &[usize]) -> Result<Vec<f64>, QualityError> {
    let (rows, cols) = dist.shape();
    if rows != cols {
        return Err(QualityError::NotSquare { rows, cols });
    }
    let n = rows;
    if labels.len() != n {
        return Err(QualityError::LabelCount {
            labels: labels.len(),
            samples: n,
        });
    }

    // Map arbitrary labels onto 0..k
    let mut ids: HashMap<usize, usize> = HashMap::new();
    let dense: Vec<usize> = labels
        .iter()
        .map(|l| {
            let next = ids.len();
            *ids.entry(*l).or_insert(next)
        })
        .collect();
    let k = ids.len();
    if k < 2 {
        return Err(QualityError::SingleCluster(k));
    }
    if k >= n {
        return Err(QualityError::TooManyClusters {
            clusters: k,
            samples: n,
        });
    }

    let mut sizes = vec![0usize; k];
    for &c in &dense {
        sizes[c] += 1;
    }

    let mut sums = vec![0.0f64; k];
    let scores = (0..n)
        .map(|i| {
            let own = dense[i];
            if sizes[own] == 1 {
                return 0.0;
            }
            sums.iter_mut().for_each(|s| *s = 0.0);
            for (j, &d) in dist.row(i).iter().enumerate() {
                if j != i {
                    sums[dense[j]] += d;
                }
            }
            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();
    Ok(scores)
}

/// Mean silhouette coefficient over all samples.
pub fn silhouette_score(dist: &DistanceMatrix, labels: &[usize]) -> Result<f64, QualityError> {
    let samples = silhouette_samples(dist, labels)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[f64]) -> DistanceMatrix {
        let n = points.len();
        let data = (0..n * n)
            .map(|k| (points[k / n] - points[k % n]).abs())
            .collect();
        DistanceMatrix::from_row_major(n, n, data).unwrap()
    }

    #[test]
    fn test_two_clusters() {
        let dist = line(&[0.0, 1.0, 10.0, 11.0]);
        let scores = silhouette_samples(&dist, &[0, 0, 1, 1]).unwrap();

        // sample 0: a = 1, b = mean(10, 11)
        assert!((scores[0] - (10.5 - 1.0) / 10.5).abs() < 1e-12);
        // sample 1: a = 1, b = mean(9, 10)
        assert!((scores[1] - (9.5 - 1.0) / 9.5).abs() < 1e-12);
        assert!((scores[2] - scores[1]).abs() < 1e-12);
        assert!((scores[3] - scores[0]).abs() < 1e-12);

        let mean = silhouette_score(&dist, &[0, 0, 1, 1]).unwrap();
        assert!(mean > 0.85 && mean < 1.0);
    }

    #[test]
    fn test_bad_partition_is_negative() {
        let dist = line(&[0.0, 1.0, 10.0, 11.0]);
        let score = silhouette_score(&dist, &[0, 1, 0, 1]).unwrap();
        assert!(score < 0.0);
    }

    #[test]
    fn test_labels_need_not_be_contiguous() {
        let dist = line(&[0.0, 1.0, 10.0, 11.0]);
        let a = silhouette_score(&dist, &[0, 0, 1, 1]).unwrap();
        let b = silhouette_score(&dist, &[42, 42, 7, 7]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singleton_cluster_scores_zero() {
        let dist = line(&[0.0, 1.0, 2.0, 50.0]);
        let scores = silhouette_samples(&dist, &[1, 1, 1, 2]).unwrap();
        assert_eq!(scores[3], 0.0);
        assert!(scores[0] > 0.0);
    }

    #[test]
    fn test_coincident_points_score_zero() {
        let dist = line(&[3.0, 3.0, 3.0]);
        let scores = silhouette_samples(&dist, &[0, 0, 1]).unwrap();
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_degenerate_and_invalid_partitions() {
        let dist = line(&[0.0, 1.0, 2.0]);
        assert_eq!(
            silhouette_score(&dist, &[5, 5, 5]),
            Err(QualityError::SingleCluster(1))
        );
        assert_eq!(
            silhouette_score(&dist, &[0, 1, 2]),
            Err(QualityError::TooManyClusters { clusters: 3, samples: 3 })
        );
        assert_eq!(
            silhouette_score(&dist, &[0, 1]),
            Err(QualityError::LabelCount { labels: 2, samples: 3 })
        );

        let rect = DistanceMatrix::from_row_major(1, 2, vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            silhouette_score(&rect, &[0]),
            Err(QualityError::NotSquare { .. })
        ));
    }

    #[test]
    fn test_count_clusters() {
        assert_eq!(count_clusters(&[]), 0);
        assert_eq!(count_clusters(&[3, 1, 3, 1, 9]), 3);
    }
}
