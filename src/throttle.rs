use async_trait::async_trait;
use std::time::Duration;

pub const TEXT_REQUEST_DELAY: Duration = Duration::from_millis(500);
pub const IMAGE_REQUEST_DELAY: Duration = Duration::from_millis(1000);

/// Paces consecutive requests to a provider.
///
/// Generators call [`Throttle::pace`] before every request except the first
/// one of a batch. Swapping the implementation changes the pacing policy
/// without touching the generators.
#[async_trait]
pub trait Throttle: Send + Sync {
    async fn pace(&self);
}

/// Sleeps for the same interval every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn pace(&self) {
        if !self.delay.is_zero() {
            log::trace!("Pacing for {}ms", self.delay.as_millis());
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_sleeps() {
        let throttle = FixedDelay::new(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        throttle.pace().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        let start = Instant::now();
        FixedDelay::none().pace().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
