use super::RateLimiter;
use crate::config::secs_to_duration;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Token bucket limiter
///
/// Holds up to `capacity` tokens, refilled continuously at `capacity / window`
/// tokens per second. Each admission consumes one token, so an idle bucket
/// admits a burst of `capacity` callers immediately.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    window: Duration,
    state: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    /// Creates a full bucket
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum tokens (burst size), at least 1
    /// * `window` - Time to refill an empty bucket completely
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            capacity,
            window,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_update: Instant::now(),
            }),
        }
    }

    /// Tokens currently available, after refilling up to now
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state, Instant::now());
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_update).as_secs_f64();
        let window = self.window.as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.capacity / window).min(self.capacity);
        state.last_update = now;
    }
}

#[async_trait]
impl RateLimiter for TokenBucket {
    async fn acquire(&self) {
        // Held across the wait so queued callers are admitted one at a time, in order
        let mut state = self.state.lock().await;

        loop {
            self.refill(&mut state, Instant::now());

            if state.tokens >= 1.0 {
                state.tokens -= 1.0;
                return;
            }

            let wait = (1.0 - state.tokens) * self.window.as_secs_f64() / self.capacity;
            tracing::trace!("Token bucket empty, waiting {:.3}s", wait);
            tokio::time::sleep(secs_to_duration(wait)).await;
        }
    }

    fn name(&self) -> &'static str {
        "token-bucket"
    }
}
