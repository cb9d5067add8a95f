//! Shared state for the pmsync client.
//!
//! One [`StateStore`] holds the subscribed tokens, positions, open orders and
//! the in-flight ("performing") trade book behind a single mutex. Every
//! public method acquires the lock exactly once and releases it before
//! returning, so callers can never hold it across I/O or an `.await`.
//!
//! The [`Evictor`] drops in-flight entries that outlive
//! [`STALE_PERFORMING_TIMEOUT`].

pub mod evictor;
pub mod performing;
pub mod store;

pub use evictor::{Evictor, STALE_PERFORMING_TIMEOUT};
pub use performing::{EvictedEntry, PerformingBook};
pub use store::{StateSnapshot, StateStore};
