//! Reconnecting streaming channel.
//!
//! One [`ChannelManager`] drives one endpoint through
//! `Idle -> Connecting -> Subscribed -> Receiving -> Closed* -> Backoff -> Connecting`
//! and, unless `max_reconnect_attempts` is set, never returns.

use crate::backoff::{Backoff, BackoffConfig};
use crate::dispatch::Dispatcher;
use crate::error::{WsError, WsResult};
use crate::handshake::{Handshake, HandshakeSource};
use crate::keepalive::KeepAlive;
use crate::message::decode_payload;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use pmsync_telemetry::Metrics;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Default market channel endpoint.
pub const MARKET_WS_URL: &str = "wss://ws-subscriptions-clob.polymarket.com/ws/market";

/// Default user channel endpoint.
pub const USER_WS_URL: &str = "wss://ws-subscriptions-clob.polymarket.com/ws/user";

/// Ping frame cadence.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Re-check delay while the handshake source has nothing to subscribe to.
pub const IDLE_WAIT: Duration = Duration::from_secs(5);

/// Bound on TCP connect, TLS and the HTTP upgrade.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest prefix of an undecodable frame echoed into the log.
const PREVIEW_LEN: usize = 200;

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Name used in logs and metric labels ("market", "user").
    pub name: String,
    /// WebSocket URL.
    pub url: String,
    pub keepalive_interval: Duration,
    pub idle_wait: Duration,
    pub connect_timeout: Duration,
    pub backoff: BackoffConfig,
    /// Consecutive failed attempts before `run` gives up (0 = infinite).
    pub max_reconnect_attempts: u32,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            keepalive_interval: KEEPALIVE_INTERVAL,
            idle_wait: IDLE_WAIT,
            connect_timeout: CONNECT_TIMEOUT,
            backoff: BackoffConfig::default(),
            max_reconnect_attempts: 0, // Infinite
        }
    }

    pub fn market() -> Self {
        Self::new("market", MARKET_WS_URL)
    }

    pub fn user() -> Self {
        Self::new("user", USER_WS_URL)
    }
}

/// Channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Subscribed,
    Receiving,
    ClosedClean,
    ClosedError,
    Backoff,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Receiving => "receiving",
            Self::ClosedClean => "closed_clean",
            Self::ClosedError => "closed_error",
            Self::Backoff => "backoff",
        };
        f.write_str(s)
    }
}

/// Streaming channel manager.
pub struct ChannelManager {
    config: ChannelConfig,
    handshake: Arc<dyn HandshakeSource>,
    dispatcher: Arc<dyn Dispatcher>,
    state: Arc<RwLock<ChannelState>>,
}

impl ChannelManager {
    pub fn new(
        config: ChannelConfig,
        handshake: Arc<dyn HandshakeSource>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            config,
            handshake,
            dispatcher,
            state: Arc::new(RwLock::new(ChannelState::Idle)),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Get current channel state.
    pub fn state(&self) -> ChannelState {
        *self.state.read()
    }

    fn set_state(&self, state: ChannelState) {
        *self.state.write() = state;
    }

    /// Run the channel until the process ends.
    ///
    /// Returns only when `max_reconnect_attempts` is non-zero and that many
    /// consecutive attempts failed.
    pub async fn run(&self) -> WsResult<()> {
        let mut backoff = Backoff::new(self.config.backoff);

        loop {
            self.set_state(ChannelState::Connecting);

            let result = match self.handshake.handshake() {
                Ok(Handshake::NotReady) => {
                    self.set_state(ChannelState::Idle);
                    debug!(
                        channel = %self.config.name,
                        wait_ms = self.config.idle_wait.as_millis() as u64,
                        "Nothing to subscribe to yet, waiting"
                    );
                    tokio::time::sleep(self.config.idle_wait).await;
                    continue;
                }
                Ok(handshake) => self.session(&handshake, &mut backoff).await,
                Err(e) => Err(e),
            };

            self.record_disconnect(&result);

            self.set_state(ChannelState::Backoff);
            let delay = backoff.next_delay();
            let attempt = backoff.consecutive_failures();

            if self.config.max_reconnect_attempts > 0
                && attempt >= self.config.max_reconnect_attempts
            {
                error!(channel = %self.config.name, attempt, "Max reconnection attempts reached");
                return Err(WsError::ConnectionFailed(format!(
                    "{}: max reconnection attempts reached ({attempt})",
                    self.config.name
                )));
            }

            warn!(
                channel = %self.config.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One connection: connect, handshake, then read until it ends.
    async fn session(&self, handshake: &Handshake, backoff: &mut Backoff) -> WsResult<()> {
        let channel = self.config.name.as_str();
        info!(channel, url = %self.config.url, "Connecting to WebSocket");

        let connect = connect_async_tls_with_config(&self.config.url, None, true, None);
        let (ws_stream, _response) = tokio::time::timeout(self.config.connect_timeout, connect)
            .await
            .map_err(|_| {
                WsError::ConnectionFailed(format!(
                    "timed out after {}ms",
                    self.config.connect_timeout.as_millis()
                ))
            })??;
        let (mut write, mut read) = ws_stream.split();
        Metrics::ws_connected(channel);

        if let Handshake::Message(msg) = handshake {
            write
                .send(Message::Text(msg.text().to_owned()))
                .await
                .map_err(|e| WsError::SendFailed(e.to_string()))?;
            info!(channel, message = msg.loggable(), "Sent subscription message");
        }
        backoff.reset();
        self.set_state(ChannelState::Subscribed);

        let mut keepalive = KeepAlive::new(self.config.keepalive_interval);
        let mut ping_timer = tokio::time::interval_at(
            Instant::now() + keepalive.interval(),
            keepalive.interval(),
        );
        ping_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.set_state(ChannelState::Receiving);

        let result = 'receive: loop {
            tokio::select! {
                msg = read.next() => {
                    let handled = match msg {
                        Some(Ok(Message::Text(text))) => self.handle_payload(text.as_bytes()),
                        Some(Ok(Message::Binary(data))) => self.handle_payload(&data),
                        Some(Ok(Message::Ping(data))) => {
                            debug!(channel, "Received ping, sending pong");
                            write.send(Message::Pong(data)).await.map_err(WsError::from)
                        }
                        Some(Ok(Message::Pong(_))) => {
                            keepalive.record_pong();
                            Ok(())
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = frame
                                .map(|f| (f.code.into(), f.reason.to_string()))
                                .unwrap_or((1000, "Normal close".to_string()));
                            Err(WsError::ConnectionClosed { code, reason })
                        }
                        Some(Ok(Message::Frame(_))) => Ok(()),
                        Some(Err(e)) => Err(e.into()),
                        None => break 'receive Ok(()),
                    };
                    if let Err(e) = handled {
                        break 'receive Err(e);
                    }
                }

                _ = ping_timer.tick() => {
                    if let Err(e) = write.send(Message::Ping(Vec::new())).await {
                        break 'receive Err(e.into());
                    }
                    keepalive.record_ping();
                }
            }
        };

        let stats = keepalive.stats();
        debug!(
            channel,
            last_ping = ?stats.last_ping,
            last_pong = ?stats.last_pong,
            unanswered = stats.unanswered,
            "Session ended"
        );
        result
    }

    /// Decode and dispatch one frame. Undecodable frames are skipped.
    fn handle_payload(&self, bytes: &[u8]) -> WsResult<()> {
        let payload = match decode_payload(bytes) {
            Ok(payload) => payload,
            Err(e) => {
                Metrics::ws_decode_failure(&self.config.name);
                let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(PREVIEW_LEN)]);
                warn!(
                    channel = %self.config.name,
                    error = %e,
                    %preview,
                    "Skipping message that is not valid JSON"
                );
                return Ok(());
            }
        };

        self.dispatcher.dispatch(&payload)?;
        Metrics::ws_message(&self.config.name);
        Ok(())
    }

    fn record_disconnect(&self, result: &WsResult<()>) {
        let channel = self.config.name.as_str();
        let established = matches!(
            self.state(),
            ChannelState::Subscribed | ChannelState::Receiving
        );

        Metrics::ws_disconnected(channel);
        Metrics::ws_reconnect(
            channel,
            result.as_ref().err().map_or("stream_end", WsError::reason_label),
        );

        match result {
            Ok(()) => {
                self.set_state(ChannelState::ClosedClean);
                info!(channel, "Connection closed by peer");
            }
            Err(WsError::ConnectionClosed { code, reason }) => {
                self.set_state(ChannelState::ClosedClean);
                warn!(channel, code, %reason, "Connection closed");
            }
            Err(e) if !established => {
                self.set_state(ChannelState::ClosedError);
                error!(channel, error = %e, "Failed to establish connection");
            }
            Err(e) => {
                self.set_state(ChannelState::ClosedError);
                error!(channel, error = %e, "Exception while receiving");
            }
        }
    }
}
