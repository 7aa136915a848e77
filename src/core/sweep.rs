// sweep.rs - Parallel parameter sweep with static round-robin ownership

use std::iter::StepBy;
use std::ops::Range;
use std::time::Instant;

use tracing::{info, warn};

use crate::core::dispatch::{guarded, run_pool, worker_count, DispatchOptions};
use crate::core::error::{EngineError, EngineResult, EvaluationError};
use crate::core::slots::ValueSlots;

/// One evaluated sweep point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub x: f64,
    pub y: f64,
}

impl SweepPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Parallel `(x, y)` arrays, one slot per parameter, in parameter order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SweepResult {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = SweepPoint> + '_ {
        self.x.iter().zip(&self.y).map(|(&x, &y)| SweepPoint { x, y })
    }

    /// Point with the highest score; ties keep the earliest parameter.
    pub fn best(&self) -> Option<SweepPoint> {
        self.points().fold(None, |best, p| match best {
            Some(b) if b.y >= p.y => Some(b),
            _ => Some(p),
        })
    }
}

/// Indices owned by `worker` in a pool of `nprocs`: `worker, worker + nprocs, ...`
pub fn round_robin(worker: usize, nprocs: usize, len: usize) -> StepBy<Range<usize>> {
    (worker.min(len)..len).step_by(nprocs.max(1))
}

/// Evaluate every parameter in parallel.
///
/// Parameter `p` is evaluated by worker `p % nprocs`, which writes slot `p`
/// of both output arrays. An [`EvaluationError::Degenerate`] result keeps its
/// `x` and scores 0; any other failure aborts the sweep.
pub fn parameter_sweep<P, F>(params: &[P], evaluate: F, options: &DispatchOptions) -> EngineResult<SweepResult>
where
    P: Sync,
    F: Fn(&P) -> Result<SweepPoint, EvaluationError> + Sync,
{
    options.validate()?;
    let len = params.len();
    let nprocs = worker_count(options.workers, len);
    let xs = ValueSlots::zeroed(len);
    let ys = ValueSlots::zeroed(len);
    let start = Instant::now();

    run_pool("parameter sweep", len, nprocs, options, |worker, termination| {
        for p in round_robin(worker, nprocs, len) {
            if termination.stop_requested() {
                break;
            }
            if let Some(progress) = &options.progress {
                if p % options.progress_every == 0 {
                    progress(p, len);
                }
            }

            let outcome = guarded(worker, p, || Ok(evaluate(&params[p])))?;
            let point = match outcome {
                Ok(point) => point,
                Err(EvaluationError::Degenerate { x }) => {
                    warn!("Sweep parameter {} gives a degenerate cut; scoring it 0", p);
                    SweepPoint::new(x, 0.0)
                }
                Err(EvaluationError::Failed(err)) => {
                    return Err(EngineError::worker_failure(worker, p, &err));
                }
            };
            xs.set(p, point.x);
            ys.set(p, point.y);
        }
        Ok(())
    })?;

    info!(
        "Parameter sweep over {} values finished in {:.2}s",
        len,
        start.elapsed().as_secs_f64()
    );
    Ok(SweepResult {
        x: xs.into_vec(),
        y: ys.into_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_round_robin_partition_p20_n3() {
        let owned: Vec<Vec<usize>> = (0..3).map(|k| round_robin(k, 3, 20).collect()).collect();
        assert_eq!(owned[0], vec![0, 3, 6, 9, 12, 15, 18]);
        assert_eq!(owned[1], vec![1, 4, 7, 10, 13, 16, 19]);
        assert_eq!(owned[2], vec![2, 5, 8, 11, 14, 17]);

        let mut all: Vec<usize> = owned.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_round_robin_more_workers_than_items() {
        assert_eq!(round_robin(4, 8, 3).count(), 0);
        assert_eq!(round_robin(0, 8, 0).count(), 0);
    }

    #[test]
    fn test_sweep_slots_follow_parameter_order() {
        let params: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let result = parameter_sweep(
            &params,
            |&t| Ok(SweepPoint::new(t, t * t)),
            &DispatchOptions::default().with_workers(3),
        )
        .unwrap();

        assert_eq!(result.len(), 20);
        for (i, p) in result.points().enumerate() {
            assert_eq!(p.x, params[i]);
            assert_eq!(p.y, params[i] * params[i]);
        }
    }

    #[test]
    fn test_sweep_workers_own_residue_classes() {
        let params: Vec<usize> = (0..20).collect();
        let owners = Mutex::new(vec![None; 20]);
        parameter_sweep(
            &params,
            |&p| {
                let name = std::thread::current().name().map(str::to_string);
                owners.lock()[p] = name;
                Ok(SweepPoint::new(p as f64, 0.0))
            },
            &DispatchOptions::default().with_workers(3),
        )
        .unwrap();

        let owners = owners.into_inner();
        for p in 0..20 {
            let expected = format!("pairdist-worker-{}", p % 3);
            assert_eq!(owners[p].as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_degenerate_cut_scores_zero() {
        let params = vec![1.0, 2.0, 3.0];
        let result = parameter_sweep(
            &params,
            |&t| {
                if t > 2.5 {
                    Err(EvaluationError::Degenerate { x: 1.0 })
                } else {
                    Ok(SweepPoint::new(t, 0.75))
                }
            },
            &DispatchOptions::default().with_workers(2),
        )
        .unwrap();
        assert_eq!(result.x, vec![1.0, 2.0, 1.0]);
        assert_eq!(result.y, vec![0.75, 0.75, 0.0]);
    }

    #[test]
    fn test_failed_evaluation_aborts_sweep() {
        let params: Vec<u32> = (0..10).collect();
        let result = parameter_sweep(
            &params,
            |&p| {
                if p == 7 {
                    return Err(anyhow::anyhow!("partition exploded").into());
                }
                Ok(SweepPoint::new(p as f64, 1.0))
            },
            &DispatchOptions::default().with_workers(4),
        );
        match result {
            Err(EngineError::WorkerFailure { worker, index, reason }) => {
                assert_eq!(index, 7);
                assert_eq!(worker, 3);
                assert!(reason.contains("partition exploded"));
            }
            other => panic!("Expected WorkerFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_interrupt_stops_sweep() {
        use crate::core::termination::InterruptHandle;

        let interrupt = InterruptHandle::new();
        let trigger = interrupt.clone();
        let evaluated = Mutex::new(Vec::new());
        let params: Vec<u32> = (0..10).collect();
        let result = parameter_sweep(
            &params,
            |&p| {
                evaluated.lock().push(p);
                if p == 2 {
                    trigger.trigger();
                }
                Ok(SweepPoint::new(p as f64, 0.5))
            },
            &DispatchOptions::default().with_workers(1).with_interrupt(interrupt),
        );
        assert!(result.unwrap_err().is_interrupted());
        assert_eq!(evaluated.into_inner(), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_sweep() {
        let params: Vec<f64> = Vec::new();
        let result = parameter_sweep(
            &params,
            |_| -> Result<SweepPoint, EvaluationError> { unreachable!() },
            &DispatchOptions::default(),
        )
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.best(), None);
    }

    #[test]
    fn test_best_point() {
        let result = SweepResult {
            x: vec![2.0, 3.0, 4.0, 5.0],
            y: vec![0.1, 0.6, 0.6, 0.2],
        };
        assert_eq!(result.best(), Some(SweepPoint::new(3.0, 0.6)));
    }
}
