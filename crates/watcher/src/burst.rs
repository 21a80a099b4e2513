//! Burst resampling.
//!
//! After a workspace switch or app activation, a few extra samples are
//! taken on top of the periodic baseline. Arming a new burst cancels the
//! samples still pending from the previous one.

use backdrop_scheduler::{Scheduler, TimerKey};

use crate::config::BurstConfig;

/// Payload of a burst timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstSample {
    pub generation: u64,
    pub index: usize,
}

#[derive(Debug)]
pub struct BurstResampler {
    config: BurstConfig,
    generation: u64,
    in_flight: Vec<(usize, TimerKey)>,
}

impl BurstResampler {
    pub fn new(config: BurstConfig) -> Self {
        Self {
            config,
            generation: 0,
            in_flight: Vec::new(),
        }
    }

    /// Cancel the pending burst and schedule a new one.
    ///
    /// The first sample is due immediately, the rest follow `spacing` apart.
    /// Returns the new burst's generation.
    pub fn arm(&mut self, scheduler: &mut Scheduler<BurstSample>) -> u64 {
        self.cancel(scheduler);
        self.generation += 1;

        for index in 0..self.config.count {
            let delay = self.config.spacing().saturating_mul(index as u32);
            let key = scheduler.schedule(
                BurstSample {
                    generation: self.generation,
                    index,
                },
                delay,
            );
            self.in_flight.push((index, key));
        }

        tracing::debug!(
            generation = self.generation,
            count = self.config.count,
            spacing_ms = self.config.spacing_ms,
            "Burst armed"
        );
        self.generation
    }

    /// Cancel every pending sample of the current burst.
    pub fn cancel(&mut self, scheduler: &mut Scheduler<BurstSample>) {
        for (_, key) in self.in_flight.drain(..) {
            scheduler.cancel(&key);
        }
    }

    /// Account for a fired burst timer. Returns `false` for a sample that
    /// does not belong to the current burst.
    pub fn fired(&mut self, sample: BurstSample) -> bool {
        if sample.generation != self.generation {
            return false;
        }
        // Keys of expired timers may be reused by the queue; forget them.
        self.in_flight.retain(|(index, _)| *index != sample.index);
        true
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Samples of the current burst not yet fired.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
