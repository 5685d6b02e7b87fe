//! Source elements: the manual switch and the free-running clock.
//!
//! Neither has input ports. Both change state through the same
//! `set_input(self, 0, value)` path as every other element, so a toggle
//! propagates exactly like a derived signal.

use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A manually toggled source.
#[derive(Debug, Clone, Default)]
pub struct SourceSwitch {
    pub state: bool,
}

impl SourceSwitch {
    /// Create a switch in the given state.
    pub fn new(state: bool) -> Self {
        Self { state }
    }
}

/// A source that toggles on a fixed period.
///
/// The clock itself keeps no timer. A scheduler outside the engine reports
/// elapsed time through [`Clock::accumulate`] (or forces an edge directly),
/// and the engine applies the resulting toggles.
#[derive(Debug, Clone)]
pub struct Clock {
    pub state: bool,
    period: Duration,
    elapsed: Duration,
}

impl Clock {
    /// Create a clock, low, with the given toggle period.
    pub fn new(period: Duration) -> Self {
        Self {
            state: false,
            period,
            elapsed: Duration::ZERO,
        }
    }

    /// Time between two toggles.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the toggle period. Accumulated time is kept.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    /// Add elapsed wall time and return how many toggles are now due.
    ///
    /// A zero period never fires. The count saturates at `u32::MAX`.
    pub fn accumulate(&mut self, dt: Duration) -> u32 {
        if self.period.is_zero() {
            return 0;
        }
        let period = self.period.as_nanos();
        let elapsed = self.elapsed.as_nanos() + dt.as_nanos();
        // remainder < period, so it fits back into a Duration
        let rest = elapsed % period;
        self.elapsed = Duration::new(
            u64::try_from(rest / NANOS_PER_SEC).unwrap_or(u64::MAX),
            (rest % NANOS_PER_SEC) as u32,
        );
        u32::try_from(elapsed / period).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_accumulate() {
        let mut clk = Clock::new(Duration::from_millis(100));
        assert_eq!(clk.accumulate(Duration::from_millis(40)), 0);
        assert_eq!(clk.accumulate(Duration::from_millis(60)), 1);
        assert_eq!(clk.accumulate(Duration::from_millis(250)), 2);
        // 50ms left over
        assert_eq!(clk.accumulate(Duration::from_millis(50)), 1);
    }

    #[test]
    fn test_accumulate_saturates() {
        let mut clk = Clock::new(Duration::from_nanos(1));
        assert_eq!(clk.accumulate(Duration::from_secs(5)), u32::MAX);
        // nothing carried over
        assert_eq!(clk.accumulate(Duration::ZERO), 0);

        let mut slow = Clock::new(Duration::from_millis(300));
        assert_eq!(slow.accumulate(Duration::from_millis(1000)), 3);
        assert_eq!(slow.accumulate(Duration::from_millis(200)), 1);
        assert_eq!(slow.period(), Duration::from_millis(300));
    }

    #[test]
    fn test_zero_period_never_fires() {
        let mut clk = Clock::new(Duration::ZERO);
        assert_eq!(clk.accumulate(Duration::from_secs(10)), 0);
    }
}
