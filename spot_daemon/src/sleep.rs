//! Cancellable sleeping.
//!
//! Workers never call `thread::sleep` directly. They wait through a `Sleeper`, which
//! wakes early when shutdown is requested. `StopSignal` is the production sleeper: the
//! supervisor keeps the sending half of a `crossbeam_channel` and drops it to stop
//! every worker at once; a waiting `recv_timeout` then returns `Disconnected`
//! immediately. Tests substitute a sleeper that advances a manual clock instead.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};

/// Why a sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Stopped,
}

pub trait Sleeper: Send {
    /// Block for `duration` or until stop is requested, whichever comes first.
    fn sleep(&self, duration: Duration) -> Wake;

    fn stop_requested(&self) -> bool;
}

/// Sending half held by the supervisor; dropping it (or calling `stop`) stops everyone.
#[derive(Debug)]
pub struct StopHandle {
    tx: Option<Sender<()>>,
}

impl StopHandle {
    pub fn stop(&mut self) {
        self.tx.take();
    }
}

/// Receiving half cloned into each worker.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: Receiver<()>,
}

/// A connected stop handle/signal pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = bounded::<()>(0);
    (StopHandle { tx: Some(tx) }, StopSignal { rx })
}

impl Sleeper for StopSignal {
    fn sleep(&self, duration: Duration) -> Wake {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => Wake::Elapsed,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => Wake::Stopped,
        }
    }

    fn stop_requested(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }
}
