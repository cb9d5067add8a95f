//! Tick counter deciding which refreshes run on a given tick.

/// Markets are refreshed on every tick divisible by this.
pub const MARKETS_EVERY_TICKS: u32 = 6;

/// Memory is reclaimed, and the counter restarts, on ticks divisible by this.
pub const RECLAIM_EVERY_TICKS: u32 = 12;

/// Work selected for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    /// 1-based position in the cycle.
    pub tick: u32,
    pub refresh_markets: bool,
    pub reclaim: bool,
}

/// 1-based tick counter.
///
/// [`plan`](Self::plan) is side-effect free; the counter only moves on
/// [`commit`](Self::commit), so a tick whose work failed is retried with the
/// same phase.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    counter: u32,
    markets_every: u32,
    reclaim_every: u32,
}

impl TickSchedule {
    #[must_use]
    pub fn new() -> Self {
        Self::with_periods(MARKETS_EVERY_TICKS, RECLAIM_EVERY_TICKS)
    }

    /// Custom periods. Zero is treated as one.
    #[must_use]
    pub fn with_periods(markets_every: u32, reclaim_every: u32) -> Self {
        Self {
            counter: 1,
            markets_every: markets_every.max(1),
            reclaim_every: reclaim_every.max(1),
        }
    }

    /// Counter value for the next tick.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    #[must_use]
    pub fn plan(&self) -> TickPlan {
        TickPlan {
            tick: self.counter,
            refresh_markets: self.counter % self.markets_every == 0,
            reclaim: self.counter % self.reclaim_every == 0,
        }
    }

    /// Advance past a tick whose work completed.
    pub fn commit(&mut self, plan: TickPlan) {
        self.counter = if plan.reclaim { 1 } else { plan.tick + 1 };
    }
}

impl Default for TickSchedule {
    fn default() -> Self {
        Self::new()
    }
}
