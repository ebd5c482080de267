//! Trailing-edge debounce gate.
//!
//! A single slot: each [`DebounceGate::trigger`] replaces whatever task is
//! still waiting, so out of a burst of triggers only the last one runs.
//! Only the waiting phase is cancelable; a task that has started runs to
//! completion, and a task triggered meanwhile starts its delay only after the
//! running one finishes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::time::{Instant, sleep_until};

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct DebounceGate {
    delay: Duration,
    /// Dropping this sender cancels the waiting task.
    pending: Option<oneshot::Sender<()>>,
    /// Held while a task executes; serializes executions.
    executing: Arc<Mutex<()>>,
}

impl DebounceGate {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            executing: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the delay used by subsequent triggers.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Schedule `task` after the current delay, replacing any waiting task.
    pub fn trigger<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        // Replacing the sender drops the previous one, which cancels its task
        // if it has not started yet.
        self.pending = Some(cancel_tx);

        let task: Task = Box::pin(task);
        let delay = self.delay;
        let requested_at = Instant::now();
        let executing = Arc::clone(&self.executing);

        tokio::spawn(async move {
            let wait = async {
                let mut deadline = requested_at + delay;
                if executing.try_lock().is_err() {
                    // Another task is executing; the delay starts once it is done.
                    drop(executing.lock().await);
                    deadline = Instant::now() + delay;
                }
                if deadline > Instant::now() {
                    sleep_until(deadline).await;
                }
            };

            tokio::select! {
                biased;
                _ = cancel_rx => return,
                () = wait => {}
            }

            let _guard = executing.lock_owned().await;
            task.await;
        });
    }

    /// Cancel the waiting task, if any. A running task is unaffected.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel();
    }
}
