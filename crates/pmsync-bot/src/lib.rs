//! pmsync application.
//!
//! Wires the shared state store, the refresh scheduler thread and the two
//! supervised streaming channels together.

pub mod app;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod supervisor;

pub use app::Application;
pub use collaborators::{ConfigRefresher, LoggingMarketHandler, LoggingUserHandler};
pub use config::{AppConfig, MarketsConfig, SchedulerSettings, WebsocketConfig};
pub use error::{AppError, AppResult};
pub use supervisor::{Supervisor, RESTART_DELAY};
