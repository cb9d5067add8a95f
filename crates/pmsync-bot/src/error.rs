//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{channel} channel failed: {source}")]
    ChannelFailed {
        channel: &'static str,
        source: pmsync_ws::WsError,
    },

    #[error("{channel} channel task ended abnormally: {reason}")]
    ChannelAborted {
        channel: &'static str,
        reason: String,
    },

    #[error("Refresh error: {0}")]
    Refresh(#[from] pmsync_core::CoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] pmsync_scheduler::SchedulerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] pmsync_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
