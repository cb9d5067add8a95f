//! Stale in-flight trade eviction.

use crate::performing::EvictedEntry;
use crate::store::StateStore;
use chrono::{DateTime, Utc};
use pmsync_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// In-flight entries older than this are assumed lost and dropped.
pub const STALE_PERFORMING_TIMEOUT: Duration = Duration::from_secs(15);

/// Removes in-flight trades that were never confirmed or cancelled.
#[derive(Debug, Clone)]
pub struct Evictor {
    store: Arc<StateStore>,
    timeout: Duration,
}

impl Evictor {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self::with_timeout(store, STALE_PERFORMING_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<StateStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one eviction pass at `now`.
    ///
    /// The scan and removal happen under a single lock acquisition; logging
    /// happens after the lock is released.
    pub fn evict(&self, now: DateTime<Utc>) -> Vec<EvictedEntry> {
        let evicted = self.store.evict_stale(now, self.timeout);
        if evicted.is_empty() {
            return evicted;
        }

        for entry in &evicted {
            info!(
                category = %entry.category,
                trade_id = %entry.trade_id,
                age_ms = (now - entry.added_at).num_milliseconds(),
                timeout_secs = self.timeout.as_secs(),
                "Removing stale in-flight trade"
            );
        }
        Metrics::performing_evicted(evicted.len());
        debug!(
            evicted = evicted.len(),
            remaining = self.store.performing().len(),
            "Eviction pass complete"
        );

        evicted
    }
}
