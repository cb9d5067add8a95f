//! Joint supervision of the market and user channels.
//!
//! Both channels run as tasks on the current runtime. The first one to fail
//! takes the other down with it; after [`RESTART_DELAY`] both start again from
//! a fresh state.

use crate::error::{AppError, AppResult};
use pmsync_telemetry::Metrics;
use pmsync_ws::WsResult;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Pause between a joint failure and the restart of both channels.
pub const RESTART_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Supervisor {
    restart_delay: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_restart_delay(RESTART_DELAY)
    }

    pub fn with_restart_delay(restart_delay: Duration) -> Self {
        Self { restart_delay }
    }

    /// Start both channels and wait until either fails or both return.
    ///
    /// Whatever is still running afterwards is aborted.
    pub async fn run_once<M, MF, U, UF>(&self, market: &M, user: &U) -> AppResult<()>
    where
        M: Fn() -> MF,
        MF: Future<Output = WsResult<()>> + Send + 'static,
        U: Fn() -> UF,
        UF: Future<Output = WsResult<()>> + Send + 'static,
    {
        let market_task = tokio::spawn(market());
        let user_task = tokio::spawn(user());
        let market_abort = market_task.abort_handle();
        let user_abort = user_task.abort_handle();

        let result = tokio::try_join!(
            join_channel("market", market_task),
            join_channel("user", user_task)
        );

        market_abort.abort();
        user_abort.abort();

        result.map(|_| ())
    }

    /// Supervise forever.
    pub async fn run<M, MF, U, UF>(&self, market: M, user: U)
    where
        M: Fn() -> MF,
        MF: Future<Output = WsResult<()>> + Send + 'static,
        U: Fn() -> UF,
        UF: Future<Output = WsResult<()>> + Send + 'static,
    {
        loop {
            match self.run_once(&market, &user).await {
                Ok(()) => info!("Both channels returned"),
                Err(e) => error!(error = %e, "Channel failure, restarting both channels"),
            }

            Metrics::supervisor_restart();
            info!(
                delay_ms = self.restart_delay.as_millis() as u64,
                "Reconnecting to the websocket"
            );
            tokio::time::sleep(self.restart_delay).await;
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

async fn join_channel(channel: &'static str, task: JoinHandle<WsResult<()>>) -> AppResult<()> {
    match task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(AppError::ChannelFailed { channel, source }),
        Err(e) => Err(AppError::ChannelAborted {
            channel,
            reason: e.to_string(),
        }),
    }
}
