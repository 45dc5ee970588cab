//! Environment abstraction for deterministic testing.
//!
//! Decouples pipeline and history logic from wall-clock time so that tests
//! can drive session-expiry and retry-timing scenarios deterministically
//! instead of racing real sleeps.

use std::time::Duration;

/// Abstract environment providing monotonic time and the one blocking
/// primitive (`sleep`) that driver code is allowed to await.
///
/// Protocol and history logic never call `sleep` directly; only pipeline
/// drivers (the downlink sending worker's 500 ms poll, the uplink retry
/// backoff) do.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use [`std::time::Instant`]; a simulation
    /// environment may substitute a virtual clock so that inactivity-window
    /// and retry-timing tests do not depend on real elapsed time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// Must never decrease within a single execution context.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production [`Environment`] backed by the real system clock and the tokio
/// timer wheel.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_env_now_is_monotonic() {
        let env = SystemEnv;
        let first = env.now();
        env.sleep(Duration::from_millis(1)).await;
        let second = env.now();
        assert!(second >= first);
    }
}
