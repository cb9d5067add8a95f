//! API credentials for the authenticated user channel.
//!
//! The three fields are opaque secrets handed over by whoever loads the
//! configuration; nothing here generates or validates them.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// CLOB API key triple.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ApiCredentials {
    api_key: String,
    secret: String,
    passphrase: String,
}

impl ApiCredentials {
    pub fn new(
        api_key: impl Into<String>,
        secret: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            passphrase: passphrase.into(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// True when any of the three fields is empty.
    pub fn is_incomplete(&self) -> bool {
        self.api_key.is_empty() || self.secret.is_empty() || self.passphrase.is_empty()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}
