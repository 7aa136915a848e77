// dispatch.rs - Work cursor and fixed worker pool

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::core::error::{EngineError, EngineResult};
use crate::core::termination::{panic_message, InterruptHandle, Termination};

/// Default reporting granularity for progress callbacks
pub const DEFAULT_PROGRESS_EVERY: usize = 100;

/// Name prefix of the pool threads that run user code under `catch_unwind`
pub const WORKER_THREAD_PREFIX: &str = "pairdist-worker-";

/// Progress callback: `(claimed_index, total_units)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Options shared by every parallel builder.
#[derive(Clone)]
pub struct DispatchOptions {
    /// Upper bound on the pool size (default: number of CPUs)
    pub workers: Option<usize>,
    /// Fire `progress` whenever a claimed index is a multiple of this
    pub progress_every: usize,
    pub progress: Option<ProgressCallback>,
    pub interrupt: InterruptHandle,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            workers: None,
            progress_every: DEFAULT_PROGRESS_EVERY,
            progress: None,
            interrupt: InterruptHandle::new(),
        }
    }
}

impl fmt::Debug for DispatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchOptions")
            .field("workers", &self.workers)
            .field("progress_every", &self.progress_every)
            .field("progress", &self.progress.as_ref().map(|_| "<callback>"))
            .field("interrupt", &self.interrupt)
            .finish()
    }
}

impl DispatchOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_progress(mut self, every: usize, callback: ProgressCallback) -> Self {
        self.progress_every = every;
        self.progress = Some(callback);
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub(crate) fn validate(&self) -> EngineResult<()> {
        if self.workers == Some(0) {
            return Err(EngineError::InvalidInput(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.progress_every == 0 {
            return Err(EngineError::InvalidInput(
                "progress granularity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn cursor(&self, len: usize) -> WorkCursor {
        match &self.progress {
            Some(callback) => WorkCursor::with_progress(len, self.progress_every, callback.clone()),
            None => WorkCursor::new(len),
        }
    }
}

/// Pool size for a call: never more workers than units of work.
pub fn worker_count(requested: Option<usize>, units: usize) -> usize {
    requested.unwrap_or_else(num_cpus::get).min(units)
}

/// Shared monotonic cursor over `[0, len)`.
///
/// Each index is handed out exactly once across all callers; once the
/// cursor reaches `len` every claim reports exhaustion.
pub struct WorkCursor {
    next: AtomicUsize,
    len: usize,
    progress_every: usize,
    progress: Option<ProgressCallback>,
}

impl WorkCursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
            progress_every: DEFAULT_PROGRESS_EVERY,
            progress: None,
        }
    }

    pub fn with_progress(len: usize, every: usize, callback: ProgressCallback) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
            progress_every: every.max(1),
            progress: Some(callback),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Claim the next unprocessed index, or `None` once exhausted.
    pub fn claim_next(&self) -> Option<usize> {
        let mut current = self.next.load(Ordering::Relaxed);
        loop {
            if current >= self.len {
                return None;
            }
            match self.next.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.report(current);
                    return Some(current);
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn report(&self, index: usize) {
        if let Some(callback) = &self.progress {
            if index % self.progress_every == 0 {
                callback(index, self.len);
            }
        }
    }
}

/// Run one unit of user code for `index`, turning errors and panics into a
/// typed worker failure.
pub(crate) fn guarded<T, F>(worker: usize, index: usize, f: F) -> EngineResult<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(EngineError::worker_failure(worker, index, &err)),
        Err(payload) => Err(EngineError::WorkerFailure {
            worker,
            index,
            reason: format!("panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

/// True for threads spawned by [`run_pool`]. A panic on one of them is
/// already reported as [`EngineError::WorkerFailure`].
pub fn is_worker_thread(name: &str) -> bool {
    name.starts_with(WORKER_THREAD_PREFIX)
}

/// Spawn `nprocs` workers, run `worker(id, termination)` on each, and join.
///
/// The first error returned by any worker cancels the rest; the caller gets
/// that error after every worker has stopped.
pub(crate) fn run_pool<W>(
    operation: &str,
    units: usize,
    nprocs: usize,
    options: &DispatchOptions,
    worker: W,
) -> EngineResult<()>
where
    W: Fn(usize, &Termination<'_>) -> EngineResult<()> + Sync,
{
    let termination = Termination::new(&options.interrupt);
    if termination.stop_requested() || nprocs == 0 {
        return termination.finish(operation);
    }

    debug!("{}: {} units across {} workers", operation, units, nprocs);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nprocs)
        .thread_name(|i| format!("{}{}", WORKER_THREAD_PREFIX, i))
        .build()
        .map_err(|e| EngineError::ThreadPool(e.to_string()))?;

    pool.broadcast(|ctx| {
        if let Err(err) = worker(ctx.index(), &termination) {
            termination.fail(err);
        }
    });

    termination.finish(operation)
}
