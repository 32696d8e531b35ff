//! Fixed-interval timer that drives latch sampling.
//!
//! The timer is polled from the main `tokio::select!` loop.  While inactive,
//! [`LatchTimer::tick`] never completes, so its branch simply stays idle.

use std::time::{Duration, Instant};

use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::debug;

pub struct LatchTimer {
    period: Duration,
    ticker: Option<Interval>,
}

impl LatchTimer {
    /// A zero period is raised to one millisecond.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            ticker: None,
        }
    }

    /// Starts (or restarts) the timer.  Must be called inside a Tokio runtime.
    pub fn start(&mut self) {
        self.cancel();
        debug!("latch timer started ({} ms)", self.period.as_millis());
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
    }

    /// Stops the timer; does nothing if it is not running.
    pub fn cancel(&mut self) {
        if self.ticker.take().is_some() {
            debug!("latch timer cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.ticker.is_some()
    }

    /// Waits for the next period and returns the sample time.
    pub async fn tick(&mut self) -> Instant {
        match self.ticker.as_mut() {
            Some(ticker) => ticker.tick().await.into_std(),
            None => std::future::pending().await,
        }
    }
}
