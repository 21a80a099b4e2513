//! Periodic ticks multiplexed with cancellable one-shot timers.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::time::{delay_queue, DelayQueue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("scheduler period must be greater than zero")]
    ZeroPeriod,
}

/// Handle to a scheduled one-shot timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerKey(delay_queue::Key);

/// Something that came due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick<T> {
    /// The periodic interval fired.
    Periodic(Instant),
    /// A one-shot timer expired.
    Timer(T),
}

/// Periodic baseline plus one-shot timers, consumed from a single task.
///
/// A late periodic tick is delayed rather than bursting to catch up. When a
/// timer and the periodic tick are due together the timer comes first.
///
/// Must be created inside a tokio runtime.
pub struct Scheduler<T> {
    ticker: Interval,
    timers: DelayQueue<T>,
}

impl<T> Scheduler<T> {
    /// The first periodic tick fires immediately.
    pub fn new(period: Duration) -> Result<Self, SchedulerError> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(period_ms = period.as_millis() as u64, "Scheduler created");

        Ok(Self {
            ticker,
            timers: DelayQueue::new(),
        })
    }

    pub fn period(&self) -> Duration {
        self.ticker.period()
    }

    /// Fire `payload` after `delay`. A zero delay fires on the next poll.
    pub fn schedule(&mut self, payload: T, delay: Duration) -> TimerKey {
        let key = self.timers.insert(payload, delay);
        tracing::trace!(
            delay_ms = delay.as_millis() as u64,
            pending = self.timers.len(),
            "Timer scheduled"
        );
        TimerKey(key)
    }

    /// Cancel a timer, returning its payload if it had not fired yet.
    pub fn cancel(&mut self, key: &TimerKey) -> Option<T> {
        let payload = self.timers.try_remove(&key.0).map(|expired| expired.into_inner());
        tracing::trace!(
            cancelled = payload.is_some(),
            pending = self.timers.len(),
            "Timer cancelled"
        );
        payload
    }

    /// Cancel every pending timer.
    pub fn clear(&mut self) {
        tracing::trace!(pending = self.timers.len(), "Timers cleared");
        self.timers.clear();
    }

    /// Number of pending timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Wait for the next tick or timer.
    ///
    /// Cancel safe: dropping the future loses nothing.
    pub async fn next(&mut self) -> Tick<T> {
        let Self { ticker, timers } = self;

        tokio::select! {
            biased;
            Some(expired) = std::future::poll_fn(|cx| timers.poll_expired(cx)) => {
                Tick::Timer(expired.into_inner())
            }
            instant = ticker.tick() => Tick::Periodic(instant.into_std()),
        }
    }
}
