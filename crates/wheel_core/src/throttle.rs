use std::time::Duration;

pub const PUBLISH_INTERVAL: Duration = Duration::from_millis(40);

#[derive(Debug)]
pub struct PublishThrottle {
    min_interval: Duration,
    last_sent: Option<Duration>,
}

impl PublishThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    pub fn try_acquire(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_sent {
            if now.saturating_sub(last) < self.min_interval {
                // Denied acquires do not push the window.
                return false;
            }
        }
        self.last_sent = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_acquire_is_always_eligible() {
        let mut throttle = PublishThrottle::new(PUBLISH_INTERVAL);
        assert!(throttle.try_acquire(ms(0)));
    }

    #[test]
    fn acquires_inside_the_window_are_denied() {
        let mut throttle = PublishThrottle::new(PUBLISH_INTERVAL);
        assert!(throttle.try_acquire(ms(100)));
        assert!(!throttle.try_acquire(ms(110)));
    }

    #[test]
    fn acquires_outside_the_window_pass() {
        let mut throttle = PublishThrottle::new(PUBLISH_INTERVAL);
        assert!(throttle.try_acquire(ms(100)));
        assert!(throttle.try_acquire(ms(150)));
    }

    #[test]
    fn exact_window_boundary_is_eligible() {
        let mut throttle = PublishThrottle::new(PUBLISH_INTERVAL);
        assert!(throttle.try_acquire(ms(100)));
        assert!(throttle.try_acquire(ms(140)));
    }

    #[test]
    fn denied_acquire_does_not_push_the_window() {
        let mut throttle = PublishThrottle::new(PUBLISH_INTERVAL);
        assert!(throttle.try_acquire(ms(100)));
        assert!(!throttle.try_acquire(ms(130)));
        assert!(throttle.try_acquire(ms(140)));
    }

    #[test]
    fn reset_forces_the_next_acquire() {
        let mut throttle = PublishThrottle::new(PUBLISH_INTERVAL);
        assert!(throttle.try_acquire(ms(100)));
        throttle.reset();
        assert!(throttle.try_acquire(ms(101)));
    }
}
