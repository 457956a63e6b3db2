use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Token bucket rate limiter for oracle request throttling
///
/// Shared by every concurrent generation of a round, so the configured rate
/// holds for the whole process rather than per task.
#[derive(Clone)]
pub struct TokenBucketRateLimiter {
    state: Arc<Mutex<Bucket>>,
    /// Maximum token capacity
    capacity: f64,
    /// Tokens added per second
    refill_rate: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucketRateLimiter {
    /// Create a limiter allowing `requests_per_second`, starting full
    ///
    /// Non-positive rates are clamped to a small positive value; config
    /// validation rejects them before they get here.
    pub fn new(requests_per_second: f64) -> Self {
        let rate = if requests_per_second > 0.0 {
            requests_per_second
        } else {
            f64::EPSILON
        };
        let capacity = rate.max(1.0);
        Self {
            state: Arc::new(Mutex::new(Bucket {
                tokens: capacity,
                last_refill: Instant::now(),
            })),
            capacity,
            refill_rate: rate,
        }
    }

    /// Acquire a token from the bucket, waiting if necessary
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens = (bucket.tokens + elapsed * self.refill_rate).min(self.capacity);
                bucket.last_refill = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                (1.0 - bucket.tokens) / self.refill_rate
            };
            sleep(Duration::from_secs_f64(wait.max(0.01))).await;
        }
    }

    /// Tokens currently available (for tests and diagnostics)
    pub async fn available(&self) -> f64 {
        self.state.lock().await.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_up_to_capacity_is_immediate() {
        let limiter = TokenBucketRateLimiter::new(5.0);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(limiter.available().await < 1.0);
    }

    #[tokio::test]
    async fn test_waits_for_refill() {
        let limiter = TokenBucketRateLimiter::new(20.0);
        for _ in 0..20 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        // One token at 20/s takes about 50ms.
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_clones_share_the_bucket() {
        let limiter = TokenBucketRateLimiter::new(2.0);
        let clone = limiter.clone();
        limiter.acquire().await;
        clone.acquire().await;
        assert!(limiter.available().await < 1.0);
    }
}
