//! First message sent on each new connection.

use crate::error::WsResult;
use crate::message::{MarketSubscription, UserSubscription};
use pmsync_core::{ApiCredentials, TokenSource};
use std::fmt;
use std::sync::Arc;

/// Serialized handshake plus whether it may appear in logs.
#[derive(Clone)]
pub struct HandshakeMessage {
    text: String,
    sensitive: bool,
}

impl HandshakeMessage {
    pub fn public(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sensitive: false,
        }
    }

    /// A message carrying secrets; never logged.
    pub fn sensitive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sensitive: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_sensitive(&self) -> bool {
        self.sensitive
    }

    /// Text that is safe to write to logs.
    pub fn loggable(&self) -> &str {
        if self.sensitive {
            "<redacted>"
        } else {
            &self.text
        }
    }
}

impl fmt::Debug for HandshakeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeMessage")
            .field("text", &self.loggable())
            .finish()
    }
}

/// What to do at the start of a connection attempt.
#[derive(Debug, Clone)]
pub enum Handshake {
    /// Connect without sending anything first.
    None,
    /// Connect and send this message.
    Message(HandshakeMessage),
    /// Nothing to subscribe to yet; wait and re-check instead of connecting.
    NotReady,
}

/// Builds the handshake fresh for every connection attempt.
pub trait HandshakeSource: Send + Sync {
    fn handshake(&self) -> WsResult<Handshake>;
}

/// Market channel: subscribe to the current token list.
pub struct MarketHandshake {
    tokens: Arc<dyn TokenSource>,
}

impl MarketHandshake {
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self { tokens }
    }
}

impl HandshakeSource for MarketHandshake {
    fn handshake(&self) -> WsResult<Handshake> {
        let tokens = self.tokens.tokens();
        if tokens.is_empty() {
            return Ok(Handshake::NotReady);
        }
        let text = serde_json::to_string(&MarketSubscription::new(tokens))?;
        Ok(Handshake::Message(HandshakeMessage::public(text)))
    }
}

/// User channel: authenticate with API credentials.
pub struct UserHandshake {
    credentials: ApiCredentials,
}

impl UserHandshake {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }
}

impl HandshakeSource for UserHandshake {
    fn handshake(&self) -> WsResult<Handshake> {
        let text = serde_json::to_string(&UserSubscription::new(&self.credentials))?;
        Ok(Handshake::Message(HandshakeMessage::sensitive(text)))
    }
}

impl HandshakeSource for Handshake {
    fn handshake(&self) -> WsResult<Handshake> {
        Ok(self.clone())
    }
}
