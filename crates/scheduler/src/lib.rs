//! Timing primitives for backdrop.
//!
//! - [`Clock`]: injected monotonic time ([`TokioClock`], [`ManualClock`])
//! - [`Scheduler`]: periodic baseline ticks plus cancellable one-shot
//!   timers, awaited from one task so every callback is serialized

mod clock;
mod scheduler;

pub use clock::{Clock, ManualClock, TokioClock};
pub use scheduler::{Scheduler, SchedulerError, Tick, TimerKey};
