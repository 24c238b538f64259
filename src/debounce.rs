// SPDX-License-Identifier: Apache-2.0

//! Trailing-edge debounce for async calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Runs `f` with the most recent value once `delay` has passed without a
/// new trigger. Each trigger aborts the previous call, whether it is still
/// waiting or already running.
pub struct Debouncer<T> {
    delay: Duration,
    callback: Arc<dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F, Fut>(delay: Duration, f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            delay,
            callback: Arc::new(move |value: T| f(value).boxed()),
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a call with `value`, replacing any pending one. Must be
    /// called from within a tokio runtime.
    pub fn trigger(&self, value: T) {
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback(value).await;
        });

        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Aborts the last scheduled call, if any. A call already past its delay
    /// is stopped at its next await point.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.get_mut().take() {
            handle.abort();
        }
    }
}
