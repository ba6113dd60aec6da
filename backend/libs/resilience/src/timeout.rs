/// Timeout wrapper for outbound calls
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Deadline applied to every outbound call made through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl TimeoutConfig {
    pub const DEFAULT_SECS: u64 = 30;

    pub fn from_secs(secs: u64) -> Self {
        Self {
            duration: Duration::from_secs(secs),
        }
    }

    /// Run `future` under this deadline.
    pub async fn run<F, T>(&self, future: F) -> Result<T, TimeoutError>
    where
        F: Future<Output = T>,
    {
        with_timeout(self.duration, future).await
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::from_secs(Self::DEFAULT_SECS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
}

/// Execute a future with a deadline.
///
/// The inner output is returned untouched, so a fallible future yields
/// `Result<Result<T, E>, TimeoutError>` and the caller decides how the two
/// error kinds merge.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    timeout(duration, future)
        .await
        .map_err(|_| TimeoutError::Elapsed(duration))
}
