// SPDX-License-Identifier: GPL-3.0-only

//! Ordered single-worker execution of engine operations
//!
//! The native engine is not reentrant, so every expensive call (capture,
//! settings estimation, preview rendering) is funneled through exactly one
//! worker thread. Jobs run FIFO; each completion value is posted into the
//! control-thread inbox channel, never invoked inline on the submitting
//! thread. Skippable submission keeps preview regeneration from backlogging.

use crate::constants::timing::DISPATCHER_CLOSE_GRACE;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

enum Job<T> {
    Run(Box<dyn FnOnce() -> T + Send + 'static>),
    Shutdown,
}

/// FIFO, single-concurrency dispatcher for engine operations
///
/// Completions are delivered in submission order through the channel given
/// at construction. Failures inside a job must be carried in the completion
/// value itself; the dispatcher never retries and never lets a fault cross
/// the thread boundary.
pub struct OpsDispatcher<T: Send + 'static> {
    job_tx: mpsc::Sender<Job<T>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
    exited_rx: mpsc::Receiver<()>,
    name: String,
}

impl<T: Send + 'static> OpsDispatcher<T> {
    /// Start the worker thread; completions are sent through `completion_tx`
    pub fn new(name: &str, completion_tx: UnboundedSender<T>) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job<T>>();
        let (exited_tx, exited_rx) = mpsc::channel::<()>();
        let pending = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        let worker_pending = Arc::clone(&pending);
        let worker_closed = Arc::clone(&closed);
        let worker_name = name.to_string();

        debug!(name = %name, "Starting ops dispatcher");

        let worker = thread::spawn(move || {
            while let Ok(job) = job_rx.recv() {
                match job {
                    Job::Run(op) => {
                        if worker_closed.load(Ordering::SeqCst) {
                            // Queued behind a close; drop without running
                            worker_pending.fetch_sub(1, Ordering::SeqCst);
                            continue;
                        }
                        let outcome = op();
                        if !worker_closed.load(Ordering::SeqCst) {
                            let _ = completion_tx.send(outcome);
                        }
                        worker_pending.fetch_sub(1, Ordering::SeqCst);
                    }
                    Job::Shutdown => break,
                }
            }
            debug!(name = %worker_name, "Ops dispatcher worker exiting");
            let _ = exited_tx.send(());
        });

        Self {
            job_tx,
            worker: Some(worker),
            pending,
            closed,
            exited_rx,
            name: name.to_string(),
        }
    }

    /// Enqueue an operation; returns whether it was accepted
    ///
    /// The closure runs on the worker thread; its return value is posted to
    /// the completion channel.
    pub fn submit<F>(&self, op: F) -> bool
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            debug!(name = %self.name, "Submit rejected: dispatcher closed");
            return false;
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.job_tx.send(Job::Run(Box::new(op))).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Enqueue an operation only when the worker is idle
    ///
    /// If any submitted operation has not yet completed, the call is a no-op
    /// and no completion will ever be delivered for it. Used for preview
    /// regeneration so a backlog of stale previews cannot accumulate.
    pub fn submit_skippable<F>(&self, op: F) -> bool
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if self.pending.load(Ordering::SeqCst) > 0 {
            debug!(name = %self.name, "Skippable operation dropped: worker busy");
            return false;
        }
        self.submit(op)
    }

    /// Number of submitted operations that have not yet completed
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop accepting work and shut the worker down
    ///
    /// Jobs queued but not started are dropped. The in-flight operation gets
    /// a bounded grace period to finish; after that the worker thread is
    /// detached rather than joined. Completions that would arrive after close
    /// are dropped, not delivered. Safe to call twice, and safe to call from
    /// the control thread with completions still sitting in the inbox.
    pub fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(name = %self.name, "Closing ops dispatcher");
        let _ = self.job_tx.send(Job::Shutdown);

        match self.exited_rx.recv_timeout(DISPATCHER_CLOSE_GRACE) {
            Ok(()) => {
                if let Some(handle) = self.worker.take() {
                    let _ = handle.join();
                }
            }
            Err(_) => {
                warn!(
                    name = %self.name,
                    grace_ms = DISPATCHER_CLOSE_GRACE.as_millis() as u64,
                    "Worker did not finish within grace period, detaching"
                );
                self.worker.take();
            }
        }
    }
}

impl<T: Send + 'static> Drop for OpsDispatcher<T> {
    fn drop(&mut self) {
        self.close();
    }
}
