//! Prometheus metrics for pmsync.
//!
//! Covers channel connection health, message decoding, stale-entry eviction,
//! scheduler refreshes and supervisor restarts.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration failure
//! means duplicate metric names, which is a programming error that should
//! crash at first use rather than silently drop data.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_int_counter, CounterVec, Encoder,
    GaugeVec, IntCounter, TextEncoder,
};

/// Channel connection state (1 = connected, 0 = disconnected).
/// Labels: channel (market/user)
pub static WS_CONNECTED: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "pmsync_ws_connected",
        "Streaming channel connection state (1=connected)",
        &["channel"]
    )
    .unwrap()
});

/// Reconnect attempts per channel.
/// Labels: channel, reason (connect_failed/closed/error)
pub static WS_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmsync_ws_reconnect_total",
        "Total streaming channel reconnection attempts",
        &["channel", "reason"]
    )
    .unwrap()
});

/// Inbound messages that could not be decoded as JSON.
pub static WS_DECODE_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmsync_ws_decode_failures_total",
        "Inbound messages skipped because they were not valid JSON",
        &["channel"]
    )
    .unwrap()
});

/// Decoded messages handed to the dispatch callback.
pub static WS_MESSAGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmsync_ws_messages_total",
        "Decoded messages dispatched",
        &["channel"]
    )
    .unwrap()
});

/// In-flight trade entries removed for exceeding the stale timeout.
pub static PERFORMING_EVICTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pmsync_performing_evictions_total",
        "Stale in-flight trade entries evicted"
    )
    .unwrap()
});

/// Successful collaborator refreshes.
/// Labels: kind (markets/positions/orders)
pub static REFRESH_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pmsync_refresh_total",
        "Successful collaborator refresh calls",
        &["kind"]
    )
    .unwrap()
});

/// Scheduler ticks aborted by a refresh failure.
pub static REFRESH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pmsync_refresh_failures_total",
        "Scheduler ticks aborted by a failed refresh"
    )
    .unwrap()
});

/// Joint channel restarts performed by the supervisor.
pub static SUPERVISOR_RESTARTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pmsync_supervisor_restarts_total",
        "Joint restarts of the market and user channels"
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record channel connected.
    pub fn ws_connected(channel: &str) {
        WS_CONNECTED.with_label_values(&[channel]).set(1.0);
    }

    /// Record channel disconnected.
    pub fn ws_disconnected(channel: &str) {
        WS_CONNECTED.with_label_values(&[channel]).set(0.0);
    }

    /// Record a reconnect attempt.
    pub fn ws_reconnect(channel: &str, reason: &str) {
        WS_RECONNECT_TOTAL
            .with_label_values(&[channel, reason])
            .inc();
    }

    /// Record a message skipped for failing to decode.
    pub fn ws_decode_failure(channel: &str) {
        WS_DECODE_FAILURES_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Record a dispatched message.
    pub fn ws_message(channel: &str) {
        WS_MESSAGES_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Record evicted in-flight entries.
    pub fn performing_evicted(count: usize) {
        PERFORMING_EVICTIONS_TOTAL.inc_by(count as u64);
    }

    /// Record a successful refresh.
    pub fn refresh_ok(kind: &str) {
        REFRESH_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record an aborted tick.
    pub fn refresh_failed() {
        REFRESH_FAILURES_TOTAL.inc();
    }

    /// Record a joint channel restart.
    pub fn supervisor_restart() {
        SUPERVISOR_RESTARTS_TOTAL.inc();
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failure_counter() {
        let before = WS_DECODE_FAILURES_TOTAL
            .with_label_values(&["test-decode"])
            .get();
        Metrics::ws_decode_failure("test-decode");
        let after = WS_DECODE_FAILURES_TOTAL
            .with_label_values(&["test-decode"])
            .get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn test_render_contains_registered_metrics() {
        Metrics::ws_connected("test-render");
        Metrics::supervisor_restart();
        let text = Metrics::render().unwrap();
        assert!(text.contains("pmsync_ws_connected"));
        assert!(text.contains("pmsync_supervisor_restarts_total"));
    }
}
