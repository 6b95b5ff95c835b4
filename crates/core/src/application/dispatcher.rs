// Cross-thread dispatcher: single-consumer callback queue drained on a fixed tick
//
// Producers (the worker) never touch observer state. They enqueue callbacks
// that receive `&mut S`; only the context that owns the `Dispatcher` runs them,
// so `S` has exactly one writer and needs no lock.

use super::panic_guard::{execute_guarded, PanicGuardResult};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

type Callback<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Producer handle; cheap to clone, never blocks
pub struct DispatchHandle<S> {
    tx: mpsc::UnboundedSender<Callback<S>>,
}

impl<S> Clone for DispatchHandle<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S: 'static> DispatchHandle<S> {
    /// Queue `f` to run on the observer context.
    ///
    /// Returns false when the observer is gone; the callback is dropped.
    pub fn call<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.tx.send(Box::new(f)).is_ok()
    }
}

/// Result of one drain pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainStatus {
    pub executed: usize,
    pub panicked: usize,
    /// Every handle is dropped and the queue is empty
    pub closed: bool,
}

/// Consumer side, owned by the observer
pub struct Dispatcher<S> {
    rx: mpsc::UnboundedReceiver<Callback<S>>,
}

/// Create a dispatcher and its first producer handle
pub fn dispatch_channel<S: 'static>() -> (Dispatcher<S>, DispatchHandle<S>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { rx }, DispatchHandle { tx })
}

impl<S: 'static> Dispatcher<S> {
    /// Run every queued callback in FIFO order against `state`
    ///
    /// A panicking callback is logged and skipped; the rest still run.
    pub fn drain(&mut self, state: &mut S) -> DrainStatus {
        let mut status = DrainStatus {
            executed: 0,
            panicked: 0,
            closed: false,
        };

        loop {
            match self.rx.try_recv() {
                Ok(callback) => {
                    let result = execute_guarded(AssertUnwindSafe(|| callback(&mut *state)));
                    match result {
                        PanicGuardResult::Success(()) => status.executed += 1,
                        PanicGuardResult::Panicked(msg) => {
                            error!(panic_msg = %msg, "Observer callback panicked");
                            status.panicked += 1;
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    status.closed = true;
                    break;
                }
            }
        }

        status
    }

    /// Drain every `tick` until all producers are gone and the queue is empty
    ///
    /// Visible latency of a worker event is at most one tick.
    pub async fn pump_until_closed(mut self, state: &mut S, tick: Duration) {
        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let status = self.drain(state);
            if status.executed > 0 || status.panicked > 0 {
                debug!(
                    executed = status.executed,
                    panicked = status.panicked,
                    "Dispatcher drained callbacks"
                );
            }
            if status.closed {
                break;
            }
        }
    }
}
