//! Streaming channels for the CLOB market and user feeds.
//!
//! Provides one reconnecting channel implementation shared by both feeds:
//! - Capped exponential backoff (1s doubling to 30s, reset after handshake)
//! - Channel-specific handshake (token subscription or API-key auth)
//! - Keep-alive pings every 5s with no pong deadline
//! - Defensive JSON decoding (malformed frames are skipped, not fatal)
//! - Synchronous dispatch of each decoded message before the next read

pub mod backoff;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handshake;
pub mod keepalive;
pub mod message;

pub use backoff::{Backoff, BackoffConfig, BACKOFF_INITIAL, BACKOFF_MAX};
pub use connection::{
    ChannelConfig, ChannelManager, ChannelState, CONNECT_TIMEOUT, IDLE_WAIT, KEEPALIVE_INTERVAL,
    MARKET_WS_URL, USER_WS_URL,
};
pub use dispatch::{Dispatcher, MarketDispatcher, UserDispatcher};
pub use error::{WsError, WsResult};
pub use handshake::{Handshake, HandshakeMessage, HandshakeSource, MarketHandshake, UserHandshake};
pub use keepalive::{KeepAlive, KeepAliveStats};
pub use message::{decode_payload, MarketSubscription, UserAuth, UserSubscription};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
