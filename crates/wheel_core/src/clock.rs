use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Monotonic side feeds the publish throttle; wall side stamps outbound frames.
pub trait Clock: Send + Sync {
    fn elapsed(&self) -> Duration;

    fn now_utc(&self) -> DateTime<Utc>;
}

#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
