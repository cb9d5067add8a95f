//! Built-in collaborators used when no external REST or strategy layer is
//! plugged in.

use pmsync_core::{
    CoreResult, MarketMessageHandler, RefreshCollaborator, TokenId, UserMessageHandler,
};
use pmsync_state::StateStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Loads the market token list from configuration into the store.
///
/// Position and order refreshes keep the current snapshot.
pub struct ConfigRefresher {
    store: Arc<StateStore>,
    tokens: Vec<TokenId>,
}

impl ConfigRefresher {
    pub fn new(store: Arc<StateStore>, tokens: Vec<TokenId>) -> Self {
        Self { store, tokens }
    }
}

impl RefreshCollaborator for ConfigRefresher {
    fn refresh_markets(&self) -> CoreResult<()> {
        self.store.set_tokens(self.tokens.clone());
        debug!(tokens = self.tokens.len(), "Market tokens refreshed from configuration");
        Ok(())
    }

    fn refresh_positions(&self, lightweight: bool) -> CoreResult<()> {
        debug!(lightweight, "No position source configured, keeping snapshot");
        Ok(())
    }

    fn refresh_orders(&self) -> CoreResult<()> {
        debug!("No order source configured, keeping snapshot");
        Ok(())
    }
}

/// `event_type` of a message, or of each event when the feed batches them.
fn event_types(payload: &Value) -> String {
    let event_type = |v: &Value| {
        v.get("event_type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    };
    match payload {
        Value::Array(events) => events.iter().map(event_type).collect::<Vec<_>>().join(","),
        other => event_type(other),
    }
}

/// Logs each market channel message.
#[derive(Debug, Default)]
pub struct LoggingMarketHandler;

impl MarketMessageHandler for LoggingMarketHandler {
    fn process_market_message(&self, payload: &Value) -> CoreResult<()> {
        debug!(event_type = %event_types(payload), "Market message");
        Ok(())
    }
}

/// Logs each user channel message.
#[derive(Debug, Default)]
pub struct LoggingUserHandler;

impl UserMessageHandler for LoggingUserHandler {
    fn process_user_message(&self, payload: &Value) -> CoreResult<()> {
        debug!(event_type = %event_types(payload), "User message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_refresher_loads_tokens() {
        let store = Arc::new(StateStore::new());
        let refresher = ConfigRefresher::new(store.clone(), vec![TokenId::new("7")]);
        assert!(!store.has_tokens());

        refresher.refresh_markets().unwrap();
        refresher.refresh_positions(true).unwrap();
        refresher.refresh_orders().unwrap();

        assert_eq!(store.tokens(), vec![TokenId::new("7")]);
    }

    #[test]
    fn test_event_types() {
        assert_eq!(event_types(&json!({"event_type": "trade"})), "trade");
        assert_eq!(
            event_types(&json!([{"event_type": "book"}, {"event_type": "price_change"}])),
            "book,price_change"
        );
        assert_eq!(event_types(&json!("PONG")), "unknown");
    }

    #[test]
    fn test_logging_handlers_accept_anything() {
        assert!(LoggingMarketHandler.process_market_message(&json!([])).is_ok());
        assert!(LoggingUserHandler.process_user_message(&json!({})).is_ok());
    }
}
