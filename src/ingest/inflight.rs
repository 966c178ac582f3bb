//! Cancellable, deadline-bounded fetches.
//!
//! `InFlight::spawn` runs a blocking fetch on its own worker thread and
//! hands back a handle. The caller either waits for it (up to the deadline)
//! or cancels it from any thread through a `CancelHandle`. After a timeout or
//! a cancel the worker's result is discarded: nothing that arrives late is
//! ever returned to anyone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::FetchError;

/// How often a waiting caller checks for cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(25);

/// A fetch running on a worker thread.
pub struct InFlight<T> {
    rx: Receiver<T>,
    cancelled: Arc<AtomicBool>,
    deadline: Instant,
}

/// Cancels the `InFlight` it was taken from. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl<T: Send + 'static> InFlight<T> {
    /// Starts `fetch` on a worker thread; `wait` gives up after `timeout`.
    pub fn spawn<F>(timeout: Duration, fetch: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_flag = Arc::clone(&cancelled);

        thread::spawn(move || {
            let result = fetch();
            if worker_flag.load(Ordering::Acquire) {
                debug!("dropping result of abandoned request");
                return;
            }
            // The receiver may be gone if the caller timed out; that's fine.
            let _ = tx.send(result);
        });

        Self {
            rx,
            cancelled,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Abandons the request. Any result it later produces is discarded.
    pub fn cancel(self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Blocks until the fetch finishes, the deadline passes, or someone
    /// cancels through a `CancelHandle`.
    ///
    /// # Errors
    /// - `FetchError::Timeout`: the deadline passed first.
    /// - `FetchError::Cancelled`: a `CancelHandle` fired first.
    /// - `FetchError::Network`: the worker died without answering.
    pub fn wait(self) -> Result<T, FetchError> {
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return Err(FetchError::Cancelled);
            }

            let now = Instant::now();
            if now >= self.deadline {
                self.cancelled.store(true, Ordering::Release);
                return Err(FetchError::Timeout);
            }

            let slice = (self.deadline - now).min(CANCEL_POLL);
            match self.rx.recv_timeout(slice) {
                Ok(result) => {
                    // A cancel that lands while the result is in the channel
                    // still wins.
                    if self.cancelled.load(Ordering::Acquire) {
                        return Err(FetchError::Cancelled);
                    }
                    return Ok(result);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    if self.cancelled.load(Ordering::Acquire) {
                        return Err(FetchError::Cancelled);
                    }
                    return Err(FetchError::Network(
                        "request worker exited without a result".into(),
                    ));
                }
            }
        }
    }
}
