//! Tokio-based clock implementation.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Clock backed by Tokio's timer.
///
/// Both `sleep` and `now` go through `tokio::time`, so a runtime with paused
/// time (`#[tokio::test(start_paused = true)]`) auto-advances through polling
/// delays.
///
/// ```rust
/// use cctp_relay::providers::TokioClock;
///
/// let clock = TokioClock::new();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_paused_time_advances_on_sleep() {
        let clock = TokioClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(60)).await;

        assert!(clock.now().duration_since(start) >= Duration::from_secs(60));
    }
}
