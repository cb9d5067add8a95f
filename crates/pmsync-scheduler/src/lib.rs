//! Periodic refresh of the shared trading state.
//!
//! Runs on its own OS thread. Every tick evicts stale in-flight trades and
//! refreshes positions and orders; every sixth tick also refreshes markets and
//! every twelfth reclaims memory and restarts the cycle.

pub mod error;
pub mod schedule;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use schedule::{TickPlan, TickSchedule, MARKETS_EVERY_TICKS, RECLAIM_EVERY_TICKS};
pub use scheduler::{RefreshScheduler, SchedulerConfig, TICK_INTERVAL};
