//! Background refresh loop.

use crate::error::{SchedulerError, SchedulerResult};
use crate::schedule::{TickPlan, TickSchedule, MARKETS_EVERY_TICKS, RECLAIM_EVERY_TICKS};
use chrono::{DateTime, Utc};
use pmsync_core::RefreshCollaborator;
use pmsync_state::{Evictor, StateStore, STALE_PERFORMING_TIMEOUT};
use pmsync_telemetry::Metrics;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Sleep between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

const THREAD_NAME: &str = "refresh-scheduler";

// ============================================================================
// SchedulerConfig
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    /// Age after which an in-flight trade is evicted.
    pub stale_timeout: Duration,
    pub markets_every_ticks: u32,
    pub reclaim_every_ticks: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            stale_timeout: STALE_PERFORMING_TIMEOUT,
            markets_every_ticks: MARKETS_EVERY_TICKS,
            reclaim_every_ticks: RECLAIM_EVERY_TICKS,
        }
    }
}

// ============================================================================
// RefreshScheduler
// ============================================================================

/// Drives eviction and REST refreshes on a fixed cadence.
///
/// Each tick runs, in order: eviction, lightweight position refresh, order
/// refresh, then market refresh and memory reclaim when the schedule says so.
/// The first failing step ends the tick; the error is logged and the loop
/// carries on with the next tick.
pub struct RefreshScheduler {
    store: Arc<StateStore>,
    evictor: Evictor,
    refresher: Arc<dyn RefreshCollaborator>,
    schedule: TickSchedule,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<StateStore>,
        refresher: Arc<dyn RefreshCollaborator>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            evictor: Evictor::with_timeout(store.clone(), config.stale_timeout),
            store,
            refresher,
            schedule: TickSchedule::with_periods(
                config.markets_every_ticks,
                config.reclaim_every_ticks,
            ),
            interval: config.tick_interval,
        }
    }

    #[must_use]
    pub fn schedule(&self) -> &TickSchedule {
        &self.schedule
    }

    /// Run one tick's work at `now`. The counter advances only on success.
    pub fn run_tick(&mut self, now: DateTime<Utc>) -> SchedulerResult<TickPlan> {
        let plan = self.schedule.plan();

        self.evictor.evict(now);

        self.refresher.refresh_positions(true)?;
        Metrics::refresh_ok("positions");

        self.refresher.refresh_orders()?;
        Metrics::refresh_ok("orders");

        if plan.refresh_markets {
            self.refresher.refresh_markets()?;
            Metrics::refresh_ok("markets");
        }

        if plan.reclaim {
            let freed = self.store.reclaim_memory();
            debug!(freed_slots = freed, "Reclaimed state memory");
            log_metrics_snapshot();
        }

        self.schedule.commit(plan);
        Ok(plan)
    }

    /// One tick behind the error boundary: failures and panics are logged and
    /// returned, never propagated as unwinds.
    pub fn tick(&mut self) -> SchedulerResult<TickPlan> {
        let now = Utc::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_tick(now)))
            .unwrap_or_else(|payload| Err(SchedulerError::Panicked(panic_message(&*payload))));

        match &outcome {
            Ok(plan) => debug!(
                tick = plan.tick,
                markets = plan.refresh_markets,
                reclaim = plan.reclaim,
                "Refresh tick complete"
            ),
            Err(e) => {
                Metrics::refresh_failed();
                error!(error = ?e, tick = self.schedule.counter(), "Error in periodic refresh");
            }
        }
        outcome
    }

    /// Sleep-then-tick forever on the calling thread.
    pub fn run(mut self) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            stale_timeout_secs = self.evictor.timeout().as_secs(),
            "Refresh scheduler started"
        );
        loop {
            thread::sleep(self.interval);
            // Outcome already logged.
            let _ = self.tick();
        }
    }

    /// Start the loop on a dedicated, detached OS thread.
    pub fn spawn(self) -> SchedulerResult<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())?;
        Ok(handle)
    }
}

fn log_metrics_snapshot() {
    match Metrics::render() {
        Ok(text) => debug!(metrics = %text, "Metrics snapshot"),
        Err(e) => warn!(error = %e, "Failed to render metrics"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
