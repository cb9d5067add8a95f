//! The shared state store.

use crate::performing::{EvictedEntry, PerformingBook};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pmsync_core::{Category, Order, OrderId, Position, TokenId, TokenSource, TradeId};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default)]
struct StateInner {
    tokens: Vec<TokenId>,
    positions: HashMap<TokenId, Position>,
    orders: HashMap<OrderId, Order>,
    performing: PerformingBook,
}

/// Consistent copy of the whole state, taken under one lock acquisition.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    pub tokens: Vec<TokenId>,
    pub positions: HashMap<TokenId, Position>,
    pub orders: HashMap<OrderId, Order>,
    pub performing: PerformingBook,
}

/// Single source of truth shared by the scheduler thread and the channel tasks.
///
/// All access is exclusive and goes through whole-operation methods. None of
/// them performs I/O or calls back into user code while the lock is held.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<StateInner>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    /// Replace the subscribed token list.
    pub fn set_tokens(&self, tokens: Vec<TokenId>) {
        self.inner.lock().tokens = tokens;
    }

    pub fn tokens(&self) -> Vec<TokenId> {
        self.inner.lock().tokens.clone()
    }

    pub fn has_tokens(&self) -> bool {
        !self.inner.lock().tokens.is_empty()
    }

    // ------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------

    /// Replace all positions (full resync).
    pub fn replace_positions(&self, positions: HashMap<TokenId, Position>) {
        self.inner.lock().positions = positions;
    }

    /// Apply a price-only refresh: sizes of known tokens are kept, average
    /// prices are replaced, unknown tokens are inserted as given.
    pub fn update_avg_prices(&self, positions: HashMap<TokenId, Position>) {
        let mut inner = self.inner.lock();
        for (token, fresh) in positions {
            inner
                .positions
                .entry(token)
                .and_modify(|pos| pos.avg_price = fresh.avg_price)
                .or_insert(fresh);
        }
    }

    pub fn upsert_position(&self, token: TokenId, position: Position) {
        self.inner.lock().positions.insert(token, position);
    }

    pub fn position(&self, token: &TokenId) -> Option<Position> {
        self.inner.lock().positions.get(token).copied()
    }

    pub fn positions(&self) -> HashMap<TokenId, Position> {
        self.inner.lock().positions.clone()
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Replace all open orders.
    pub fn replace_orders(&self, orders: HashMap<OrderId, Order>) {
        self.inner.lock().orders = orders;
    }

    pub fn upsert_order(&self, id: OrderId, order: Order) {
        self.inner.lock().orders.insert(id, order);
    }

    pub fn remove_order(&self, id: &OrderId) -> Option<Order> {
        self.inner.lock().orders.remove(id)
    }

    pub fn orders(&self) -> HashMap<OrderId, Order> {
        self.inner.lock().orders.clone()
    }

    // ------------------------------------------------------------------
    // In-flight trades
    // ------------------------------------------------------------------

    /// Mark a trade as in flight. Set and timestamp are written together.
    pub fn add_performing(&self, category: Category, trade_id: TradeId, at: DateTime<Utc>) -> bool {
        self.inner.lock().performing.insert(category, trade_id, at)
    }

    /// Clear an in-flight trade from both the set and the timestamps.
    pub fn remove_performing(&self, category: &Category, trade_id: &TradeId) -> bool {
        self.inner.lock().performing.remove(category, trade_id)
    }

    pub fn is_performing(&self, category: &Category, trade_id: &TradeId) -> bool {
        self.inner.lock().performing.contains(category, trade_id)
    }

    pub fn performing(&self) -> PerformingBook {
        self.inner.lock().performing.clone()
    }

    /// Remove in-flight entries older than `timeout` in one locked pass.
    pub fn evict_stale(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<EvictedEntry> {
        self.inner
            .lock()
            .performing
            .evict_older_than(now, timeout)
    }

    // ------------------------------------------------------------------
    // Whole-state operations
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.inner.lock();
        StateSnapshot {
            tokens: inner.tokens.clone(),
            positions: inner.positions.clone(),
            orders: inner.orders.clone(),
            performing: inner.performing.clone(),
        }
    }

    /// Release spare capacity in every collection. Returns the slots freed.
    pub fn reclaim_memory(&self) -> usize {
        let mut inner = self.inner.lock();

        let tokens_before = inner.tokens.capacity();
        inner.tokens.shrink_to_fit();
        let mut freed = tokens_before.saturating_sub(inner.tokens.capacity());

        let positions_before = inner.positions.capacity();
        inner.positions.shrink_to_fit();
        freed += positions_before.saturating_sub(inner.positions.capacity());

        let orders_before = inner.orders.capacity();
        inner.orders.shrink_to_fit();
        freed += orders_before.saturating_sub(inner.orders.capacity());

        freed + inner.performing.shrink_to_fit()
    }
}

impl TokenSource for StateStore {
    fn tokens(&self) -> Vec<TokenId> {
        StateStore::tokens(self)
    }
}
