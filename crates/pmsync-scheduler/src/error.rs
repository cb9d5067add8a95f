//! Scheduler error types.

use pmsync_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Refresh failed: {0}")]
    Refresh(#[from] CoreError),

    #[error("Refresh panicked: {0}")]
    Panicked(String),

    #[error("Failed to spawn scheduler thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
