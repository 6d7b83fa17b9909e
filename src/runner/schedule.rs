//! Next-run computation on the monotonic clock.

use std::time::Duration;
use tokio::time::Instant;

use crate::config::CadenceMode;

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    interval: Duration,
    mode: CadenceMode,
}

impl Schedule {
    pub fn new(interval: Duration, mode: CadenceMode) -> Self {
        Self { interval, mode }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mode(&self) -> CadenceMode {
        self.mode
    }

    /// When the next cycle is due.
    ///
    /// `scheduled` is when the finished cycle was due, `finished` is when its
    /// task completed. A fixed-rate cycle that overran starts immediately and
    /// the grid re-anchors there.
    pub fn next_run_at(&self, scheduled: Instant, finished: Instant) -> Instant {
        match self.mode {
            CadenceMode::AfterCompletion => finished + self.interval,
            CadenceMode::FixedRate => {
                let next = scheduled + self.interval;
                if next < finished { finished } else { next }
            }
        }
    }
}
