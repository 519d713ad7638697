//! Worker supervisor: owns the fixed set of workers and their lifecycle.
//!
//! `start` spawns one named thread per target, all sharing the cache handle, the session
//! factory and the clock. Workers never talk to each other, so a slow or failing source
//! only ever delays its own key.
//!
//! `stop` drops the shared stop handle, which wakes every sleeping worker at once, and
//! waits up to a grace period for each worker to finish the cycle it is in. A worker
//! stuck in navigation is bounded by the fetch timeout; anything still running after
//! the grace period is reported as abandoned instead of blocking shutdown. Every worker
//! reports its exit through a completion channel, even when it panics.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{error, info, warn};
use spot_common::clock::Clock;
use spot_common::config::{Settings, TargetConfig, validate_targets};
use spot_common::{QuoteError, QuoteKey, QuoteStore};

use crate::fetch::SessionFactory;
use crate::sleep::{StopHandle, stop_channel};
use crate::worker::Worker;

/// Which workers exited within the grace period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub stopped: Vec<QuoteKey>,
    pub abandoned: Vec<QuoteKey>,
}

/// Sends the worker's key when dropped, so unwinding reports completion too.
struct CompletionGuard {
    key: QuoteKey,
    tx: Sender<QuoteKey>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(self.key);
    }
}

/// Lifecycle manager of the extraction workers. Holds no quote data.
pub struct Supervisor {
    stop: StopHandle,
    done_rx: Receiver<QuoteKey>,
    workers: Vec<(QuoteKey, JoinHandle<()>)>,
}

impl Supervisor {
    /// Spawn one worker per target.
    pub fn start(
        settings: &Settings,
        targets: Vec<TargetConfig>,
        store: Arc<dyn QuoteStore>,
        sessions: Arc<dyn SessionFactory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, QuoteError> {
        settings.validate()?;
        validate_targets(&targets)?;

        let (stop, signal) = stop_channel();
        let (done_tx, done_rx) = unbounded::<QuoteKey>();
        let mut workers = Vec::with_capacity(targets.len());

        for target in targets {
            let key = target.key;
            let worker = Worker::new(
                target,
                settings,
                Arc::clone(&store),
                Arc::clone(&sessions),
                Arc::clone(&clock),
                Box::new(signal.clone()),
            );
            let completion = CompletionGuard {
                key,
                tx: done_tx.clone(),
            };
            let handle = thread::Builder::new()
                .name(format!("worker-{key}"))
                .spawn(move || {
                    let _completion = completion;
                    worker.run();
                })?;
            workers.push((key, handle));
        }

        info!("{} workers spawned", workers.len());
        Ok(Self {
            stop,
            done_rx,
            workers,
        })
    }

    /// Keys with a running worker, in start order.
    pub fn keys(&self) -> Vec<QuoteKey> {
        self.workers.iter().map(|(key, _)| *key).collect()
    }

    /// Signal every worker to stop and wait up to `grace` for them to exit.
    pub fn stop(mut self, grace: Duration) -> ShutdownReport {
        info!("Stopping {} workers (grace {:?})", self.workers.len(), grace);
        self.stop.stop();

        let deadline = Instant::now() + grace;
        let mut finished = HashSet::new();
        while finished.len() < self.workers.len() {
            match self.done_rx.recv_deadline(deadline) {
                Ok(key) => {
                    finished.insert(key);
                }
                Err(_) => break,
            }
        }

        let mut report = ShutdownReport::default();
        for (key, handle) in self.workers {
            if finished.contains(&key) {
                if handle.join().is_err() {
                    error!("[{}] Worker panicked", key);
                }
                report.stopped.push(key);
            } else {
                warn!("[{}] Worker still busy after {:?}, abandoning it", key, grace);
                report.abandoned.push(key);
            }
        }
        info!(
            "Supervisor stopped: {} stopped, {} abandoned",
            report.stopped.len(),
            report.abandoned.len()
        );
        report
    }
}
