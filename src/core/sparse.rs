// sparse.rs - Sparse (mostly-unrelated) distance matrix builder

use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info};

use crate::core::dense::DistanceMatrix;
use crate::core::dispatch::{guarded, run_pool, worker_count, DispatchOptions};
use crate::core::error::{EngineError, EngineResult};
use crate::core::slots::{IndexSlots, ValueSlots};

/// Number of unordered pairs among `n` items, C(n, 2).
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

fn checked_pair_count(n: usize) -> Option<usize> {
    n.checked_mul(n.saturating_sub(1)).map(|twice| twice / 2)
}

/// Position of pair `(i, j)`, `i < j < n`, in the condensed pair order.
///
/// `C(n,2) - C(n-i,2) + (j - i - 1)` is a bijection from ordered pairs onto
/// `[0, C(n,2))`, which lets every worker place its results without
/// coordinating with the others.
#[inline]
pub fn triangular_offset(i: usize, j: usize, n: usize) -> usize {
    debug_assert!(i < j && j < n, "pair ({}, {}) out of range for n = {}", i, j, n);
    pair_count(n) - pair_count(n - i) + (j - i - 1)
}

/// Symmetric sparse matrix in compressed sparse row form.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    n: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseMatrix {
    /// Build from strictly-upper triplets `(i, j, value)` with `i < j < n`,
    /// adding the transpose. Repeated coordinates are summed.
    pub fn from_upper_triplets(n: usize, triplets: &[(usize, usize, f64)]) -> EngineResult<Self> {
        let mut entries = Vec::with_capacity(triplets.len() * 2);
        for &(i, j, value) in triplets {
            if i >= j || j >= n {
                return Err(EngineError::InvalidInput(format!(
                    "triplet ({}, {}) is not strictly upper-triangular for n = {}",
                    i, j, n
                )));
            }
            entries.push((i, j, value));
            entries.push((j, i, value));
        }
        entries.sort_unstable_by_key(|&(r, c, _)| (r, c));

        let mut indptr = vec![0usize; n + 1];
        let mut indices = Vec::with_capacity(entries.len());
        let mut values: Vec<f64> = Vec::with_capacity(entries.len());
        let mut last: Option<(usize, usize)> = None;
        for (r, c, value) in entries {
            if last == Some((r, c)) {
                if let Some(v) = values.last_mut() {
                    *v += value;
                }
                continue;
            }
            last = Some((r, c));
            indptr[r + 1] += 1;
            indices.push(c);
            values.push(value);
        }
        for r in 0..n {
            indptr[r + 1] += indptr[r];
        }

        Ok(Self {
            n,
            indptr,
            indices,
            values,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n, self.n)
    }

    /// Number of stored entries (both triangles)
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        match self.indices[start..end].binary_search(&j) {
            Ok(pos) => self.values[start + pos],
            Err(_) => 0.0,
        }
    }

    /// Stored `(column, value)` pairs of row `i`, in column order.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// All stored entries in row-major order.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        (0..self.n).flat_map(move |i| self.row(i).map(move |(j, v)| (i, j, v)))
    }

    pub fn upper_triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.triplets().filter(|&(i, j, _)| i < j)
    }

    pub fn to_dense(&self) -> DistanceMatrix {
        let mut data = vec![0.0; self.n * self.n];
        for (i, j, v) in self.triplets() {
            data[i * self.n + j] = v;
        }
        DistanceMatrix::square(self.n, data)
    }
}

/// Symmetric sparse matrix keeping only strictly positive distances.
///
/// Zero, negative and NaN results are treated as "unrelated" and dropped.
pub fn sparse_self<T, F>(items: &[T], distance: F, options: &DispatchOptions) -> EngineResult<SparseMatrix>
where
    T: Sync,
    F: Fn(&T, &T) -> anyhow::Result<f64> + Sync,
{
    options.validate()?;
    let n = items.len();
    let capacity = checked_pair_count(n).ok_or_else(|| {
        EngineError::InvalidInput(format!("{} items produce too many pairs for a sparse buffer", n))
    })?;

    let rows = IndexSlots::zeroed(capacity);
    let cols = IndexSlots::zeroed(capacity);
    let values = ValueSlots::zeroed(capacity);
    let cursor = options.cursor(n);
    let start = Instant::now();

    run_pool("sparse self-distance", n, worker_count(options.workers, n), options, |worker, termination| {
        while !termination.stop_requested() {
            let Some(i) = cursor.claim_next() else { break };
            let left = &items[i];
            for j in (i + 1)..n {
                if termination.stop_requested() {
                    return Ok(());
                }
                let value = guarded(worker, i, || {
                    distance(left, &items[j]).with_context(|| format!("pair ({}, {})", i, j))
                })?;
                if value > 0.0 {
                    let slot = triangular_offset(i, j, n);
                    rows.set(slot, i);
                    cols.set(slot, j);
                    values.set(slot, value);
                }
            }
        }
        Ok(())
    })?;

    debug!("Sparse buffer: {} slots allocated", values.len());
    let (rows, cols, values) = (rows.into_vec(), cols.into_vec(), values.into_vec());
    let triplets: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > 0.0)
        .map(|(k, &v)| (rows[k], cols[k], v))
        .collect();

    let matrix = SparseMatrix::from_upper_triplets(n, &triplets)?;
    info!(
        "Sparse distance matrix {} x {} computed in {:.2}s ({} of {} pairs related)",
        n,
        n,
        start.elapsed().as_secs_f64(),
        triplets.len(),
        capacity
    );
    Ok(matrix)
}
