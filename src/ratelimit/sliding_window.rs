use super::RateLimiter;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding window limiter
///
/// Keeps the exact admission instants of the trailing `window`. A caller is
/// admitted only while fewer than `max_requests` admissions fall inside it;
/// otherwise it waits for the oldest one to expire and re-evaluates.
#[derive(Debug)]
pub struct SlidingWindow {
    max_requests: usize,
    window: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindow {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = max_requests.max(1) as usize;
        Self {
            max_requests,
            window,
            admitted: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Number of admissions inside the trailing window
    pub async fn in_window(&self) -> usize {
        let mut admitted = self.admitted.lock().await;
        self.expire(&mut admitted, Instant::now());
        admitted.len()
    }

    fn expire(&self, admitted: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = admitted.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                admitted.pop_front();
            } else {
                break;
            }
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindow {
    async fn acquire(&self) {
        let mut admitted = self.admitted.lock().await;

        loop {
            let now = Instant::now();
            self.expire(&mut admitted, now);

            if admitted.len() < self.max_requests {
                admitted.push_back(now);
                return;
            }

            let oldest = match admitted.front() {
                Some(&oldest) => oldest,
                None => continue,
            };
            let wait = self.window.saturating_sub(now.saturating_duration_since(oldest));
            tracing::trace!("Sliding window full, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn name(&self) -> &'static str {
        "sliding-window"
    }
}
