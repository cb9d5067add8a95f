//! Wire messages for the market and user channels.

use crate::error::{WsError, WsResult};
use pmsync_core::{ApiCredentials, TokenId};
use serde::Serialize;
use serde_json::Value;

/// Market channel subscription, sent right after connecting.
///
/// `{"assets_ids": ["<token>", ...]}`
#[derive(Debug, Clone, Serialize)]
pub struct MarketSubscription {
    pub assets_ids: Vec<TokenId>,
}

impl MarketSubscription {
    pub fn new(assets_ids: Vec<TokenId>) -> Self {
        Self { assets_ids }
    }
}

/// User channel authentication message.
///
/// `{"type": "user", "auth": {"apiKey": .., "secret": .., "passphrase": ..}}`
#[derive(Serialize)]
pub struct UserSubscription<'a> {
    #[serde(rename = "type")]
    pub channel_type: &'static str,
    pub auth: UserAuth<'a>,
}

/// Credential block of [`UserSubscription`].
#[derive(Serialize)]
pub struct UserAuth<'a> {
    #[serde(rename = "apiKey")]
    pub api_key: &'a str,
    pub secret: &'a str,
    pub passphrase: &'a str,
}

impl<'a> UserSubscription<'a> {
    pub fn new(credentials: &'a ApiCredentials) -> Self {
        Self {
            channel_type: "user",
            auth: UserAuth {
                api_key: credentials.api_key(),
                secret: credentials.secret(),
                passphrase: credentials.passphrase(),
            },
        }
    }
}

/// Decode one inbound frame as JSON.
pub fn decode_payload(bytes: &[u8]) -> WsResult<Value> {
    serde_json::from_slice(bytes).map_err(|e| WsError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_subscription_shape() {
        let msg = MarketSubscription::new(vec![TokenId::new("111"), TokenId::new("222")]);
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"assets_ids":["111","222"]}"#);
    }

    #[test]
    fn test_user_subscription_shape() {
        let creds = ApiCredentials::new("k", "s", "p");
        let json = serde_json::to_string(&UserSubscription::new(&creds)).unwrap();
        assert_eq!(
            json,
            r#"{"type":"user","auth":{"apiKey":"k","secret":"s","passphrase":"p"}}"#
        );
    }

    #[test]
    fn test_decode_payload() {
        let value = decode_payload(br#"[{"event_type":"book"}]"#).unwrap();
        assert!(value.is_array());

        let err = decode_payload(b"PONG").unwrap_err();
        assert!(matches!(err, WsError::ParseError(_)));
    }
}
