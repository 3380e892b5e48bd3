use std::time::Duration;

/// Ticks averaged by the rolling mean.
pub(crate) const MEAN_WINDOW: u32 = 60;

/// Timing and load figures gathered at the end of every tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerformanceCounters {
    ticks: u64,
    last_tick: Duration,
    mean_tick: Duration,
    peak_projectiles: usize,
}

impl PerformanceCounters {
    /// Folds one finished tick into the counters.
    pub fn record(&mut self, elapsed: Duration, projectiles: usize) {
        self.ticks += 1;
        self.last_tick = elapsed;
        let window = u32::try_from(self.ticks.min(u64::from(MEAN_WINDOW))).unwrap_or(MEAN_WINDOW);
        self.mean_tick = if window <= 1 {
            elapsed
        } else {
            (self.mean_tick * (window - 1) + elapsed) / window
        };
        self.peak_projectiles = self.peak_projectiles.max(projectiles);
    }

    /// Ticks recorded so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Wall time spent in the most recent tick.
    #[must_use]
    pub const fn last_tick(&self) -> Duration {
        self.last_tick
    }

    /// Rolling mean over roughly the last [`MEAN_WINDOW`] ticks.
    #[must_use]
    pub const fn mean_tick(&self) -> Duration {
        self.mean_tick
    }

    /// Largest number of live projectiles seen at the end of a tick.
    #[must_use]
    pub const fn peak_projectiles(&self) -> usize {
        self.peak_projectiles
    }
}
