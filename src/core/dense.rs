// dense.rs - Dense distance matrix builder

use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::core::dispatch::{guarded, run_pool, worker_count, DispatchOptions};
use crate::core::error::{EngineError, EngineResult};
use crate::core::slots::ValueSlots;
use crate::core::sparse::pair_count;

/// Row-major matrix of distances.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Wrap a row-major buffer; `data.len()` must equal `rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> EngineResult<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(EngineError::InvalidInput(format!(
                "{} values cannot form a {} x {} matrix",
                data.len(),
                rows,
                cols
            )));
        }
        Ok(Self { rows, cols, data })
    }

    pub(crate) fn square(n: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), n * n);
        Self { rows: n, cols: n, data }
    }

    /// Rebuild the symmetric zero-diagonal matrix encoded by a condensed
    /// vector (pairs in order (0,1), (0,2), ..., (1,2), ...).
    ///
    /// An empty vector decodes to the 1 x 1 zero matrix.
    pub fn from_condensed(values: &[f64]) -> EngineResult<Self> {
        let n = condensed_side(values.len()).ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "condensed length {} is not a triangular number",
                values.len()
            ))
        })?;

        let mut data = vec![0.0; n * n];
        let mut k = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                data[i * n + j] = values[k];
                data[j * n + i] = values[k];
                k += 1;
            }
        }
        Ok(Self { rows: n, cols: n, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn is_symmetric(&self) -> bool {
        self.is_square()
            && (0..self.rows).all(|i| (i + 1..self.cols).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Upper triangle in pair order. Only defined for square matrices.
    pub fn condensed(&self) -> EngineResult<Vec<f64>> {
        if !self.is_square() {
            return Err(EngineError::InvalidInput(format!(
                "cannot condense a non-square {} x {} matrix",
                self.rows, self.cols
            )));
        }
        let n = self.rows;
        let mut out = Vec::with_capacity(pair_count(n));
        for i in 0..n {
            out.extend_from_slice(&self.row(i)[i + 1..]);
        }
        Ok(out)
    }
}

/// Side length `n` such that `n * (n - 1) / 2 == len`.
fn condensed_side(len: usize) -> Option<usize> {
    if len == 0 {
        return Some(1);
    }
    let estimate = ((1.0 + (1.0 + 8.0 * len as f64).sqrt()) / 2.0).round() as usize;
    (estimate.saturating_sub(1)..=estimate + 1).find(|&n| n >= 2 && pair_count(n) == len)
}

fn matrix_cells(rows: usize, cols: usize) -> EngineResult<usize> {
    rows.checked_mul(cols).ok_or_else(|| {
        EngineError::InvalidInput(format!("{} x {} matrix is too large", rows, cols))
    })
}

/// Symmetric N x N matrix of `distance(items[i], items[j])`.
///
/// Each unordered pair is evaluated exactly once (row `i` computes every
/// `j > i`); the lower triangle is mirrored after all workers join and the
/// diagonal is zero.
pub fn dense_self<T, F>(items: &[T], distance: F, options: &DispatchOptions) -> EngineResult<DistanceMatrix>
where
    T: Sync,
    F: Fn(&T, &T) -> anyhow::Result<f64> + Sync,
{
    options.validate()?;
    let n = items.len();
    let buffer = ValueSlots::zeroed(matrix_cells(n, n)?);
    let cursor = options.cursor(n);
    let start = Instant::now();

    run_pool("dense self-distance", n, worker_count(options.workers, n), options, |worker, termination| {
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
                buffer.set(i * n + j, value);
            }
        }
        Ok(())
    })?;

    let mut data = buffer.into_vec();
    for i in 0..n {
        for j in (i + 1)..n {
            data[j * n + i] = data[i * n + j];
        }
    }

    info!(
        "Dense distance matrix {} x {} computed in {:.2}s",
        n,
        n,
        start.elapsed().as_secs_f64()
    );
    Ok(DistanceMatrix { rows: n, cols: n, data })
}

/// N x M matrix of `distance(left[i], right[j])` for two unrelated inputs.
///
/// Workers claim rows of `left` and fill each row completely; no symmetry
/// is assumed.
pub fn dense_cross<A, B, F>(
    left: &[A],
    right: &[B],
    distance: F,
    options: &DispatchOptions,
) -> EngineResult<DistanceMatrix>
where
    A: Sync,
    B: Sync,
    F: Fn(&A, &B) -> anyhow::Result<f64> + Sync,
{
    options.validate()?;
    let (n, m) = (left.len(), right.len());
    let buffer = ValueSlots::zeroed(matrix_cells(n, m)?);
    let cursor = options.cursor(n);
    let start = Instant::now();

    run_pool("dense cross-distance", n, worker_count(options.workers, n), options, |worker, termination| {
        while !termination.stop_requested() {
            let Some(i) = cursor.claim_next() else { break };
            let a = &left[i];
            for (j, b) in right.iter().enumerate() {
                if termination.stop_requested() {
                    return Ok(());
                }
                let value = guarded(worker, i, || {
                    distance(a, b).with_context(|| format!("pair ({}, {})", i, j))
                })?;
                buffer.set(i * m + j, value);
            }
        }
        Ok(())
    })?;

    info!(
        "Cross distance matrix {} x {} computed in {:.2}s",
        n,
        m,
        start.elapsed().as_secs_f64()
    );
    Ok(DistanceMatrix {
        rows: n,
        cols: m,
        data: buffer.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::termination::InterruptHandle;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn abs_diff(a: &f64, b: &f64) -> anyhow::Result<f64> {
        Ok((a - b).abs())
    }

    #[test]
    fn test_self_matrix_symmetric_zero_diagonal() {
        let points: Vec<f64> = (0..37).map(|i| (i * i) as f64 * 0.25).collect();
        for workers in [1, 3, 8] {
            let options = DispatchOptions::default().with_workers(workers);
            let matrix = dense_self(&points, abs_diff, &options).unwrap();

            assert_eq!(matrix.shape(), (37, 37));
            assert!(matrix.is_symmetric());
            for i in 0..37 {
                assert_eq!(matrix.get(i, i), 0.0);
                for j in 0..37 {
                    assert_eq!(matrix.get(i, j), (points[i] - points[j]).abs());
                }
            }
        }
    }

    #[test]
    fn test_self_matrix_evaluates_each_pair_once() {
        let calls = AtomicUsize::new(0);
        let items: Vec<u32> = (0..20).collect();
        dense_self(
            &items,
            |a, b| {
                assert!(a < b, "only the upper triangle is evaluated");
                calls.fetch_add(1, Ordering::Relaxed);
                Ok(1.0)
            },
            &DispatchOptions::default().with_workers(4),
        )
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 190);
    }

    #[test]
    fn test_self_matrix_empty_and_single() {
        let empty: Vec<f64> = Vec::new();
        let matrix = dense_self(&empty, abs_diff, &DispatchOptions::default()).unwrap();
        assert_eq!(matrix.shape(), (0, 0));

        let single = vec![4.0];
        let matrix = dense_self(&single, abs_diff, &DispatchOptions::default()).unwrap();
        assert_eq!(matrix.as_slice(), &[0.0]);
    }

    #[test]
    fn test_cross_matrix_shape_and_every_cell() {
        let left: Vec<usize> = (0..7).collect();
        let right: Vec<usize> = (0..11).collect();
        let calls = AtomicUsize::new(0);
        let matrix = dense_cross(
            &left,
            &right,
            |a, b| {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok((a * 100 + b) as f64)
            },
            &DispatchOptions::default().with_workers(3),
        )
        .unwrap();

        assert_eq!(matrix.shape(), (7, 11));
        assert_eq!(calls.load(Ordering::Relaxed), 77);
        for i in 0..7 {
            for j in 0..11 {
                assert_eq!(matrix.get(i, j), (i * 100 + j) as f64);
            }
        }
    }

    #[test]
    fn test_cross_matrix_with_empty_side() {
        let left = vec![1.0, 2.0];
        let right: Vec<f64> = Vec::new();
        let matrix = dense_cross(&left, &right, abs_diff, &DispatchOptions::default()).unwrap();
        assert_eq!(matrix.shape(), (2, 0));
        assert!(matrix.as_slice().is_empty());
    }

    #[test]
    fn test_worker_failure_returns_no_matrix() {
        let items: Vec<u32> = (0..50).collect();
        let result = dense_self(
            &items,
            |a, b| {
                if *a == 13 && *b == 40 {
                    anyhow::bail!("scoring failed");
                }
                Ok(1.0)
            },
            &DispatchOptions::default().with_workers(4),
        );
        match result {
            Err(EngineError::WorkerFailure { index, reason, .. }) => {
                assert_eq!(index, 13);
                assert!(reason.contains("pair (13, 40)"));
                assert!(reason.contains("scoring failed"));
            }
            other => panic!("Expected WorkerFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_panicking_distance_is_a_worker_failure() {
        let items = vec![1u8, 2, 3];
        let result = dense_cross(
            &items,
            &items,
            |_, b| if *b == 3 { panic!("distance blew up") } else { Ok(0.0) },
            &DispatchOptions::default().with_workers(2),
        );
        assert!(result.unwrap_err().is_worker_failure());
    }

    #[test]
    fn test_interrupt_stops_the_call() {
        let interrupt = InterruptHandle::new();
        let trigger = interrupt.clone();
        let items: Vec<u32> = (0..200).collect();
        let result = dense_self(
            &items,
            move |a, _| {
                if *a == 5 {
                    trigger.trigger();
                }
                Ok(1.0)
            },
            &DispatchOptions::default().with_workers(2).with_interrupt(interrupt),
        );
        assert!(result.unwrap_err().is_interrupted());
    }

    #[test]
    fn test_interrupt_lands_inside_a_row() {
        let interrupt = InterruptHandle::new();
        let trigger = interrupt.clone();
        let calls = AtomicUsize::new(0);
        let left = vec![0u32];
        let right: Vec<u32> = (0..50).collect();
        let result = dense_cross(
            &left,
            &right,
            |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
                trigger.trigger();
                Ok(1.0)
            },
            &DispatchOptions::default().with_workers(1).with_interrupt(interrupt),
        );
        assert!(result.unwrap_err().is_interrupted());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sibling_failure_stops_a_slow_row() {
        let failed = AtomicBool::new(false);
        let calls_after_failure = AtomicUsize::new(0);
        let items: Vec<u32> = (0..40).collect();
        let result = dense_self(
            &items,
            |a, _| {
                if *a == 0 {
                    std::thread::sleep(Duration::from_millis(50));
                    failed.store(true, Ordering::SeqCst);
                    anyhow::bail!("row 0 failed");
                }
                if failed.load(Ordering::SeqCst) {
                    calls_after_failure.fetch_add(1, Ordering::SeqCst);
                }
                std::thread::sleep(Duration::from_millis(5));
                Ok(1.0)
            },
            &DispatchOptions::default().with_workers(2),
        );
        assert!(result.unwrap_err().is_worker_failure());
        // row 1 alone holds 38 slow pairs; at most the call in flight may finish
        assert!(calls_after_failure.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_progress_callback_reports_rows() {
        let reports = Arc::new(AtomicUsize::new(0));
        let counter = reports.clone();
        let items: Vec<f64> = (0..250).map(|i| i as f64).collect();
        let options = DispatchOptions::default().with_workers(4).with_progress(
            100,
            Arc::new(move |_, total| {
                assert_eq!(total, 250);
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        dense_self(&items, abs_diff, &options).unwrap();
        // rows 0, 100 and 200
        assert_eq!(reports.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_invalid_options_fail_before_spawning() {
        let items = vec![1.0, 2.0];
        let result = dense_self(
            &items,
            |_, _| -> anyhow::Result<f64> { panic!("must not be called") },
            &DispatchOptions::default().with_workers(0),
        );
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_condensed_round_trip() {
        let points: Vec<f64> = vec![0.5, 3.0, -1.0, 7.25, 2.0, 2.5];
        let matrix = dense_self(&points, abs_diff, &DispatchOptions::default().with_workers(2)).unwrap();

        let condensed = matrix.condensed().unwrap();
        assert_eq!(condensed.len(), 15);
        assert_eq!(condensed[0], 2.5); // (0, 1)
        assert_eq!(condensed[5], 4.0); // (1, 2)

        let restored = DistanceMatrix::from_condensed(&condensed).unwrap();
        assert_eq!(restored, matrix);
    }

    #[test]
    fn test_condensed_rejects_bad_shapes() {
        assert!(DistanceMatrix::from_condensed(&[1.0, 2.0]).is_err());
        assert_eq!(DistanceMatrix::from_condensed(&[]).unwrap().shape(), (1, 1));
        assert_eq!(DistanceMatrix::from_condensed(&[3.0]).unwrap().get(1, 0), 3.0);

        let rect = DistanceMatrix::from_row_major(2, 3, vec![0.0; 6]).unwrap();
        assert!(rect.condensed().is_err());
        assert!(DistanceMatrix::from_row_major(2, 3, vec![0.0; 5]).is_err());
    }
}
