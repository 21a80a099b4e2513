//! Monotonic clock abstraction.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Tokio's clock.
///
/// Follows `tokio::time::pause`/`advance`, so it agrees with the timers a
/// [`Scheduler`](crate::Scheduler) drives, in tests as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }

    /// Move to `instant`. Never moves backwards.
    pub fn set(&self, instant: Instant) {
        if let Ok(mut now) = self.now.lock() {
            if instant > *now {
                *now = instant;
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.advance(Duration::from_millis(150));
        assert_eq!(clock.now() - start, Duration::from_millis(150));
    }

    #[test]
    fn test_manual_clock_never_goes_back() {
        let start = Instant::now();
        let clock = ManualClock::starting_at(start + Duration::from_secs(1));
        clock.set(start);
        assert_eq!(clock.now(), start + Duration::from_secs(1));
    }

    #[test]
    fn test_shared_clock() {
        let clock = Arc::new(ManualClock::new());
        let shared: Arc<dyn Clock> = clock.clone();
        clock.advance(Duration::from_millis(10));
        assert_eq!(shared.now(), clock.now());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock;
        let before = clock.now();
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(clock.now() - before, Duration::from_millis(500));
    }
}
