// termination.rs - Failure funnel and interrupt handling shared by all builders

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use crate::core::error::{EngineError, EngineResult};

/// Cloneable flag that stops a running call from the outside.
///
/// Workers observe it before every claim and every distance call.
/// Triggering it while no call is running makes the next call fail with
/// [`EngineError::Interrupted`] as soon as it starts.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Route SIGINT/SIGTERM (Ctrl-C elsewhere) to this handle.
    ///
    /// A dedicated thread runs a current-thread tokio runtime that waits for
    /// signals. The first signal triggers the handle; a second one exits the
    /// process with status 130.
    pub fn install_signal_handler(&self) -> std::io::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let handle = self.clone();

        std::thread::Builder::new()
            .name("pairdist-signals".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        if let Err(e) = wait_for_signal().await {
                            warn!("Signal handling disabled: {}", e);
                            return;
                        }
                        if handle.is_triggered() {
                            eprintln!("Second interrupt received, exiting immediately");
                            std::process::exit(130);
                        }
                        debug!("Interrupt received, stopping workers (repeat to exit immediately)");
                        handle.trigger();
                    }
                });
            })?;
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Per-call failure funnel.
///
/// The first recorded error wins and raises the cancellation flag; later
/// errors are dropped. The driver calls [`Termination::finish`] after the
/// join barrier, which emits the single diagnostic for the call.
pub(crate) struct Termination<'a> {
    cancelled: AtomicBool,
    first_failure: Mutex<Option<EngineError>>,
    interrupt: &'a InterruptHandle,
}

impl<'a> Termination<'a> {
    pub(crate) fn new(interrupt: &'a InterruptHandle) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            first_failure: Mutex::new(None),
            interrupt,
        }
    }

    /// Checked by workers before each claim and each distance call.
    pub(crate) fn stop_requested(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        if self.interrupt.is_triggered() {
            self.fail(EngineError::Interrupted);
            return true;
        }
        false
    }

    pub(crate) fn fail(&self, err: EngineError) {
        let mut slot = self.first_failure.lock();
        if slot.is_none() {
            *slot = Some(err);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    pub(crate) fn finish(self, operation: &str) -> EngineResult<()> {
        match self.first_failure.into_inner() {
            None => Ok(()),
            Some(EngineError::Interrupted) => {
                error!("{} aborted: exit signal received", operation);
                Err(EngineError::Interrupted)
            }
            Some(err) => {
                error!("{} aborted: {}", operation, err);
                Err(err)
            }
        }
    }
}

/// Best-effort text for a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
