//! Keep-alive bookkeeping for a streaming connection.
//!
//! Pings go out on a fixed interval. Pongs are recorded for round-trip
//! logging only: feeds can stay silent for long stretches, so a missing pong
//! never closes the connection.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Keep-alive state for one connection.
#[derive(Debug)]
pub struct KeepAlive {
    /// How often to send a ping.
    interval: Duration,
    /// Last ping sent time.
    last_ping: Option<DateTime<Utc>>,
    /// Last pong received time.
    last_pong: Option<DateTime<Utc>>,
    /// Pings sent since the last pong.
    unanswered: u32,
}

impl KeepAlive {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_ping: None,
            last_pong: None,
            unanswered: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record that a ping was sent.
    pub fn record_ping(&mut self) {
        let now = Utc::now();
        self.last_ping = Some(now);
        self.unanswered = self.unanswered.saturating_add(1);
        if self.unanswered > 1 {
            debug!(unanswered = self.unanswered, "Ping sent while previous pong pending");
        }
    }

    /// Record that a pong was received.
    pub fn record_pong(&mut self) {
        let now = Utc::now();
        self.last_pong = Some(now);
        self.unanswered = 0;

        if let Some(ping_time) = self.last_ping {
            let rtt_ms = (now - ping_time).num_milliseconds();
            debug!(rtt_ms, "Received pong");
        }
    }

    /// Snapshot logged when the connection ends.
    pub fn stats(&self) -> KeepAliveStats {
        KeepAliveStats {
            last_ping: self.last_ping,
            last_pong: self.last_pong,
            unanswered: self.unanswered,
        }
    }
}

/// Keep-alive statistics.
#[derive(Debug, Clone)]
pub struct KeepAliveStats {
    pub last_ping: Option<DateTime<Utc>>,
    pub last_pong: Option<DateTime<Utc>>,
    pub unanswered: u32,
}
