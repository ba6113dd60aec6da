/// Resilience patterns for outbound calls
///
/// This library provides the guards every fan-out to an external API goes through:
/// - **Timeout**: Enforces a time limit on each outbound call
/// - **Concurrency Limiter**: Bounds how many outbound calls are in flight at once,
///   and joins a whole fan-out group all-or-nothing
///
/// # Example: Bounded fan-out with per-call timeout
///
/// ```rust,no_run
/// use resilience::{ConcurrencyLimiter, timeout::with_timeout};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let limiter = ConcurrencyLimiter::new(8);
///
///     let calls = (0..100).map(|i| async move {
///         with_timeout(Duration::from_secs(5), async move { Ok::<_, String>(i * 2) })
///             .await
///             .map_err(|e| e.to_string())?
///     });
///
///     let doubled = limiter.try_join_all(calls).await;
///     assert!(doubled.is_ok());
/// }
/// ```

pub mod limiter;
pub mod timeout;

// Re-export main types for convenience
pub use limiter::ConcurrencyLimiter;
pub use timeout::{with_timeout, TimeoutConfig, TimeoutError};
