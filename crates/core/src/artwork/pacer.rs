//! Minimum spacing between outbound artwork requests.
//!
//! The iTunes API throttles bursts, so consecutive lookups in a refresh cycle
//! are spaced by a fixed delay. The first call never waits.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Enforces a fixed minimum delay between consecutive calls.
pub struct RequestPacer {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Configured minimum delay.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until at least `interval` has passed since the previous call.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let pacer = RequestPacer::new(Duration::from_secs(5));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_consecutive_calls_are_spaced() {
        let pacer = RequestPacer::new(Duration::from_millis(40));
        let start = Instant::now();
        for _ in 0..3 {
            pacer.wait().await;
        }
        // Two gaps after the first call.
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_no_wait_when_interval_already_passed() {
        let pacer = RequestPacer::new(Duration::from_millis(10));
        pacer.wait().await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_zero_interval_never_waits() {
        let pacer = RequestPacer::new(Duration::ZERO);
        assert_eq!(pacer.interval(), Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
