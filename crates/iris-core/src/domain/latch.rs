//! Hardware latch threshold detection.
//!
//! The latch is a switch that reads "pulled" while the lid is being operated.
//! Holding it past the configured delay toggles between suspended and
//! resumed.  The monitor is sampled periodically by a timer; it fires exactly
//! once per continuous pull, on the sample where the elapsed time first
//! exceeds the delay.

use std::time::{Duration, Instant};

use tracing::{info, trace};

/// Event raised by [`LatchMonitor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchTransition {
    /// The latch has been held past the delay; suspend or resume now.
    Toggle,
}

/// Sampled latch state.
#[derive(Debug, Clone)]
pub struct LatchMonitor {
    delay: Duration,
    pulled: bool,
    started: Option<Instant>,
    elapsed: Duration,
}

impl LatchMonitor {
    /// Creates a monitor; a zero `delay` disables it.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pulled: false,
            started: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pulled(&self) -> bool {
        self.pulled
    }

    /// Feeds one sample of the latch line taken at `now`.
    pub fn update(&mut self, pulled_now: bool, now: Instant) -> Option<LatchTransition> {
        match (self.pulled, pulled_now) {
            (true, true) => {
                let started = *self.started.get_or_insert(now);
                let previous = self.elapsed;
                self.elapsed = now.saturating_duration_since(started);
                trace!("latch held for {} ms", self.elapsed.as_millis());

                (previous <= self.delay && self.elapsed > self.delay).then_some(LatchTransition::Toggle)
            }

            (true, false) => {
                self.pulled = false;
                info!("latch released");
                None
            }

            (false, true) => {
                self.pulled = true;
                self.started = Some(now);
                self.elapsed = Duration::ZERO;
                info!("latch pulled");
                None
            }

            (false, false) => None,
        }
    }
}
