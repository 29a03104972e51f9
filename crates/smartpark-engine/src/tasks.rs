//! Bounded spawner for fire-and-forget jobs.
//!
//! State uploads and arrival marks run detached so remote-store latency
//! never stalls the loop. At most `max` jobs run at once; extra jobs wait
//! for a permit inside their own task, so spawning never blocks.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, warn};

#[derive(Debug)]
struct Inner {
    permits: Semaphore,
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Handle to the detached job pool. Clones share the pool.
#[derive(Debug, Clone)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

/// Decrements the in-flight count even if the job panics.
struct InFlight(Arc<Inner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    pub fn new(max: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                permits: Semaphore::new(max.max(1)),
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
            }),
        }
    }

    /// Run `job` in the background. Its output is discarded.
    pub fn spawn<F>(&self, name: &'static str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let in_flight = InFlight(Arc::clone(&self.inner));
        tokio::spawn(async move {
            let in_flight = in_flight;
            let Ok(_permit) = in_flight.0.permits.acquire().await else {
                warn!(job = name, "background pool closed, job dropped");
                return;
            };
            debug!(job = name, "background job started");
            job.await;
        });
    }

    /// Jobs spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait until no job is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}
