/// Concurrency limiter for fan-out groups
///
/// A single limiter is shared by every inbound request of a service, so the
/// bound applies to the total number of outbound calls in flight, not per request.
use futures_util::future::try_join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl ConcurrencyLimiter {
    /// Create a limiter admitting at most `max_concurrent` calls at once.
    /// A bound of zero is raised to one so callers can never deadlock.
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of calls that could start right now without waiting
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run one call once a permit is available; the permit is released when it finishes.
    pub async fn run<F>(&self, future: F) -> F::Output
    where
        F: Future,
    {
        // The semaphore is never closed, so acquire only fails if that changes.
        let _permit = self.semaphore.acquire().await.ok();
        trace!(
            available = self.semaphore.available_permits(),
            "Permit acquired"
        );
        future.await
    }

    /// Join a fan-out group all-or-nothing.
    ///
    /// Results keep the order of `futures`, not completion order. The first
    /// error resolves the join immediately and drops the calls still pending.
    pub async fn try_join_all<I, F, T, E>(&self, futures: I) -> Result<Vec<T>, E>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Result<T, E>>,
    {
        try_join_all(futures.into_iter().map(|future| self.run(future))).await
    }
}
