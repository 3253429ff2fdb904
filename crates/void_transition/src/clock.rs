//! Animation clock
//!
//! Transitions measure elapsed time on their own monotonic clock, never on
//! the host's scaled game time, so an effect plays at full speed while
//! gameplay is paused or slowed.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

/// Monotonic time source driving transition animations
#[async_trait]
pub trait FrameClock: Send + Sync {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Suspend until the next frame
    async fn next_frame(&self);
}

/// Wall-clock frame timer
#[derive(Debug, Clone)]
pub struct RealtimeClock {
    origin: Instant,
    frame_interval: Duration,
}

impl RealtimeClock {
    /// Create a clock that ticks every `frame_interval`
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            frame_interval: frame_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }
}

impl Default for RealtimeClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

#[async_trait]
impl FrameClock for RealtimeClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn next_frame(&self) {
        tokio::time::sleep(self.frame_interval).await;
    }
}
