//! Streaming channel error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Message parse error: {0}")]
    ParseError(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] pmsync_core::CoreError),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WsError {
    /// Short label used for the reconnect metric.
    pub fn reason_label(&self) -> &'static str {
        match self {
            Self::ConnectionFailed(_) => "connect_failed",
            Self::ConnectionClosed { .. } => "closed",
            Self::SendFailed(_) => "send_failed",
            Self::ParseError(_) | Self::Json(_) => "parse",
            Self::Dispatch(_) => "dispatch",
            Self::Tungstenite(_) => "transport",
        }
    }
}

pub type WsResult<T> = Result<T, WsError>;
