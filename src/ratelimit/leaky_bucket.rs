use super::RateLimiter;
use crate::config::secs_to_duration;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Leaky bucket limiter
///
/// Spaces admissions at least `1 / rate` seconds apart. The issuance instant
/// is recorded after any wait, so a late wakeup never shortens the next gap.
#[derive(Debug)]
pub struct LeakyBucket {
    spacing: Duration,
    last_issued: Mutex<Option<Instant>>,
}

impl LeakyBucket {
    /// # Arguments
    ///
    /// * `rate` - Admissions per second, must be positive
    pub fn new(rate: f64) -> Self {
        Self {
            spacing: secs_to_duration(1.0 / rate),
            last_issued: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}

#[async_trait]
impl RateLimiter for LeakyBucket {
    async fn acquire(&self) {
        let mut last_issued = self.last_issued.lock().await;

        if let Some(last) = *last_issued {
            let since = Instant::now().saturating_duration_since(last);
            if since < self.spacing {
                let wait = self.spacing - since;
                tracing::trace!("Leaky bucket spacing, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last_issued = Some(Instant::now());
    }

    fn name(&self) -> &'static str {
        "leaky-bucket"
    }
}
