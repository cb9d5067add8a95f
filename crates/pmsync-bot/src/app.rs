//! Application wiring.

use crate::collaborators::{ConfigRefresher, LoggingMarketHandler, LoggingUserHandler};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::supervisor::Supervisor;
use pmsync_core::{MarketMessageHandler, RefreshCollaborator, UserMessageHandler};
use pmsync_scheduler::RefreshScheduler;
use pmsync_state::StateStore;
use pmsync_ws::{
    ChannelManager, MarketDispatcher, MarketHandshake, UserDispatcher, UserHandshake,
};
use std::sync::Arc;
use tracing::info;

/// Main application.
pub struct Application {
    config: AppConfig,
    store: Arc<StateStore>,
    refresher: Arc<dyn RefreshCollaborator>,
    market_handler: Arc<dyn MarketMessageHandler>,
    user_handler: Arc<dyn UserMessageHandler>,
}

impl Application {
    /// Create the application with the built-in collaborators.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        let store = Arc::new(StateStore::new());
        let refresher = Arc::new(ConfigRefresher::new(store.clone(), config.token_ids()));
        Ok(Self::with_collaborators(
            config,
            store,
            refresher,
            Arc::new(LoggingMarketHandler),
            Arc::new(LoggingUserHandler),
        ))
    }

    /// Create the application around externally provided collaborators.
    pub fn with_collaborators(
        config: AppConfig,
        store: Arc<StateStore>,
        refresher: Arc<dyn RefreshCollaborator>,
        market_handler: Arc<dyn MarketMessageHandler>,
        user_handler: Arc<dyn UserMessageHandler>,
    ) -> Self {
        Self {
            config,
            store,
            refresher,
            market_handler,
            user_handler,
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Full refresh before anything else starts.
    pub fn initial_refresh(&self) -> AppResult<()> {
        self.refresher.refresh_markets()?;
        self.refresher.refresh_positions(false)?;
        self.refresher.refresh_orders()?;

        let snapshot = self.store.snapshot();
        info!(
            markets = snapshot.tokens.len(),
            positions = snapshot.positions.len(),
            orders = snapshot.orders.len(),
            "Initial state loaded"
        );
        Ok(())
    }

    /// Run until the process is terminated.
    pub async fn run(self) -> AppResult<()> {
        let credentials = self.config.credentials();

        self.initial_refresh()?;

        let scheduler = RefreshScheduler::new(
            self.store.clone(),
            self.refresher.clone(),
            self.config.scheduler_config(),
        );
        let _scheduler_thread = scheduler.spawn()?;

        let market = {
            let config = self.config.market_channel();
            let store = self.store.clone();
            let handler = self.market_handler.clone();
            move || {
                let manager = ChannelManager::new(
                    config.clone(),
                    Arc::new(MarketHandshake::new(store.clone())),
                    Arc::new(MarketDispatcher::new(handler.clone())),
                );
                async move { manager.run().await }
            }
        };

        let user = {
            let config = self.config.user_channel();
            let handler = self.user_handler.clone();
            move || {
                let manager = ChannelManager::new(
                    config.clone(),
                    Arc::new(UserHandshake::new(credentials.clone())),
                    Arc::new(UserDispatcher::new(handler.clone())),
                );
                async move { manager.run().await }
            }
        };

        info!("Starting market and user channels");
        Supervisor::new().run(market, user).await;

        Ok(())
    }
}
