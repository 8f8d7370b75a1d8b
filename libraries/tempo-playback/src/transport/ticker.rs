//! Position tick cadence

use std::time::{Duration, Instant};

/// Shortest allowed tick interval
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Longest allowed tick interval
pub const MAX_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Decides when the next position tick is due
///
/// Driven by the caller's clock so it stays deterministic under test.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl TickScheduler {
    /// Create a scheduler; `interval` is clamped to 250-1000 ms
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.clamp(MIN_TICK_INTERVAL, MAX_TICK_INTERVAL),
            last_tick: None,
        }
    }

    /// Effective interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a tick is due at `now`; records the tick when it is
    ///
    /// The first call after [`TickScheduler::reset`] is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        let due = match self.last_tick {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_tick = Some(now);
        }
        due
    }

    /// Forget the last tick (new track, resume, seek)
    pub fn reset(&mut self) {
        self.last_tick = None;
    }
}
