//! Tick-rate accounting for the capture loop.

use tokio::time::{Duration, Instant};

/// Counts scheduler ticks per rolling window and publishes the count as a
/// step function at each window boundary.
///
/// The meter is driven entirely by the caller's clock readings, so tests
/// can feed it synthetic instants. The first tick anchors the first
/// window; the tick that closes a window is counted in the window it
/// closes, then the count restarts from zero.
#[derive(Debug)]
pub struct RateMeter {
    window: Duration,
    window_start: Option<Instant>,
    ticks: u32,
    last_rate: u32,
}

impl RateMeter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            window_start: None,
            ticks: 0,
            last_rate: 0,
        }
    }

    /// Record one tick at `now`. Returns the freshly published rate when
    /// this tick closes the current window, `None` otherwise.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        self.ticks = self.ticks.wrapping_add(1);
        if now.duration_since(start) >= self.window {
            self.last_rate = self.ticks;
            self.ticks = 0;
            self.window_start = Some(now);
            Some(self.last_rate)
        } else {
            None
        }
    }

    /// Last published rate. Holds 0 until the first window closes and then
    /// changes only at window boundaries.
    pub fn current_rate(&self) -> u32 {
        self.last_rate
    }
}
