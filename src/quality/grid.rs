// grid.rs - Parameter grids for dendrogram and cluster-count sweeps

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = stop;
            values
        }
    }
}

/// Cut heights between `min_fraction` and `max_fraction` of the tallest
/// merge in a linkage tree.
pub fn threshold_grid(min_fraction: f64, max_fraction: f64, n: usize, max_height: f64) -> Vec<f64> {
    linspace(min_fraction, max_fraction, n)
        .into_iter()
        .map(|f| f * max_height)
        .collect()
}

/// How cut heights are spread over the merge heights of a linkage tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutHeights {
    /// `min..=max` fractions of the tallest merge
    Fraction { min: f64, max: f64 },
    /// From this percentile of the merge heights up to the tallest merge
    FromPercentile(f64),
}

impl CutHeights {
    /// Ward trees concentrate their structure in the upper merges.
    pub const WARD: CutHeights = CutHeights::FromPercentile(70.0);
}

/// Percentile `q` (0..=100) with linear interpolation between closest ranks.
///
/// NaN values are ignored; `None` when nothing is left.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable_by(f64::total_cmp);
    let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// `n` cut heights for a tree whose merges happened at `merge_heights`.
pub fn cut_height_grid(merge_heights: &[f64], spread: CutHeights, n: usize) -> Vec<f64> {
    let Some(tallest) = percentile(merge_heights, 100.0) else {
        return Vec::new();
    };
    match spread {
        CutHeights::Fraction { min, max } => threshold_grid(min, max, n, tallest),
        CutHeights::FromPercentile(q) => match percentile(merge_heights, q) {
            Some(low) => linspace(low, tallest, n),
            None => Vec::new(),
        },
    }
}

/// Up to `n` distinct cluster counts spread between `min` and `max`.
pub fn cluster_grid(min: usize, max: usize, n: usize) -> Vec<usize> {
    let mut counts: Vec<usize> = linspace(min as f64, max as f64, n)
        .into_iter()
        .map(|v| v as usize)
        .collect();
    counts.sort_unstable();
    counts.dedup();
    counts
}
