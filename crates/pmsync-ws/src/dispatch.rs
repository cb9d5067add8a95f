//! Routing of decoded messages to their processors.

use pmsync_core::{CoreResult, MarketMessageHandler, UserMessageHandler};
use serde_json::Value;
use std::sync::Arc;

/// Receives every successfully decoded message of one channel, in order.
///
/// Called inline by the read loop: the next frame is not read until this
/// returns. An error ends the connection and goes through backoff.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, payload: &Value) -> CoreResult<()>;
}

impl<F> Dispatcher for F
where
    F: Fn(&Value) -> CoreResult<()> + Send + Sync,
{
    fn dispatch(&self, payload: &Value) -> CoreResult<()> {
        self(payload)
    }
}

/// Forwards market channel messages to a [`MarketMessageHandler`].
pub struct MarketDispatcher {
    handler: Arc<dyn MarketMessageHandler>,
}

impl MarketDispatcher {
    pub fn new(handler: Arc<dyn MarketMessageHandler>) -> Self {
        Self { handler }
    }
}

impl Dispatcher for MarketDispatcher {
    fn dispatch(&self, payload: &Value) -> CoreResult<()> {
        self.handler.process_market_message(payload)
    }
}

/// Forwards user channel messages to a [`UserMessageHandler`].
pub struct UserDispatcher {
    handler: Arc<dyn UserMessageHandler>,
}

impl UserDispatcher {
    pub fn new(handler: Arc<dyn UserMessageHandler>) -> Self {
        Self { handler }
    }
}

impl Dispatcher for UserDispatcher {
    fn dispatch(&self, payload: &Value) -> CoreResult<()> {
        self.handler.process_user_message(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pmsync_core::CoreError;

    struct Recorder(Mutex<Vec<Value>>);

    impl UserMessageHandler for Recorder {
        fn process_user_message(&self, payload: &Value) -> CoreResult<()> {
            self.0.lock().push(payload.clone());
            Ok(())
        }
    }

    #[test]
    fn test_user_dispatcher_forwards_payload() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let dispatcher = UserDispatcher::new(recorder.clone());

        dispatcher
            .dispatch(&serde_json::json!({"event_type": "trade"}))
            .unwrap();

        assert_eq!(recorder.0.lock().len(), 1);
    }

    #[test]
    fn test_closure_dispatcher_propagates_error() {
        let dispatcher = |_: &Value| -> CoreResult<()> { Err(CoreError::Processing("bad".into())) };
        assert!(dispatcher.dispatch(&Value::Null).is_err());
    }
}
