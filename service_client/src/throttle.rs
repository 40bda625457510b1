//! Token-bucket rate limiting for outbound protocol messages.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Parameters for the token bucket algorithm used by [`TokenBucket`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThrottleSettings {
    /// Number of messages permitted per refill interval
    pub capacity: u32,
    /// Length of the refill interval, in seconds
    pub refill_seconds: u64,
}

/// A coarse token bucket: the balance resets to capacity once a full
/// refill interval has elapsed, rather than topping up proportionally.
/// There is no timer; refill happens lazily on each attempted use.
#[derive(Debug)]
pub struct TokenBucket {
    settings: ThrottleSettings,
    available: u32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(settings: ThrottleSettings) -> Self {
        Self {
            settings,
            available: settings.capacity,
            last_refill: Instant::now(),
        }
    }

    /// Attempt to consume one token. Returns whether the send is
    /// permitted.
    pub fn try_use(&mut self) -> bool {
        self.try_use_at(Instant::now())
    }

    fn try_use_at(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_refill) >= self.refill_interval() {
            self.available = self.settings.capacity;
            self.last_refill = now;
        }

        if self.available > 0 {
            self.available -= 1;
            true
        } else {
            false
        }
    }

    /// Tokens remaining until the next refill.
    pub fn available(&self) -> u32 {
        self.available
    }

    fn refill_interval(&self) -> Duration {
        Duration::from_secs(self.settings.refill_seconds)
    }
}
