//! In-flight trade book.
//!
//! Tracks, per category, the trade ids that were submitted but not yet
//! confirmed or cancelled, together with the wall-clock time each one was
//! added. The id set and the timestamp map only change together.

use chrono::{DateTime, Utc};
use pmsync_core::{Category, TradeId};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// An entry removed by [`PerformingBook::evict_older_than`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictedEntry {
    pub category: Category,
    pub trade_id: TradeId,
    /// Insertion time of the entry.
    pub added_at: DateTime<Utc>,
}

/// Per-category sets of in-flight trade ids with insertion timestamps.
#[derive(Debug, Clone, Default)]
pub struct PerformingBook {
    trades: HashMap<Category, HashSet<TradeId>>,
    timestamps: HashMap<Category, HashMap<TradeId, DateTime<Utc>>>,
}

impl PerformingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trade id to a category. Re-adding an id refreshes its timestamp.
    ///
    /// Returns `true` if the id was not already in flight.
    pub fn insert(&mut self, category: Category, trade_id: TradeId, at: DateTime<Utc>) -> bool {
        self.timestamps
            .entry(category.clone())
            .or_default()
            .insert(trade_id.clone(), at);
        self.trades.entry(category).or_default().insert(trade_id)
    }

    /// Remove a trade id from a category.
    ///
    /// Returns `true` if the id was in flight.
    pub fn remove(&mut self, category: &Category, trade_id: &TradeId) -> bool {
        if let Some(stamps) = self.timestamps.get_mut(category) {
            stamps.remove(trade_id);
        }
        self.trades
            .get_mut(category)
            .is_some_and(|ids| ids.remove(trade_id))
    }

    pub fn contains(&self, category: &Category, trade_id: &TradeId) -> bool {
        self.trades
            .get(category)
            .is_some_and(|ids| ids.contains(trade_id))
    }

    /// Trade ids in flight for a category.
    pub fn trades_in(&self, category: &Category) -> Option<&HashSet<TradeId>> {
        self.trades.get(category)
    }

    /// Insertion time of a trade id, if recorded.
    pub fn added_at(&self, category: &Category, trade_id: &TradeId) -> Option<DateTime<Utc>> {
        self.timestamps
            .get(category)
            .and_then(|stamps| stamps.get(trade_id))
            .copied()
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.trades.keys()
    }

    /// Total number of in-flight ids across categories.
    pub fn len(&self) -> usize {
        self.trades.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every timestamped id is also in the id set of its category.
    pub fn is_consistent(&self) -> bool {
        self.timestamps.iter().all(|(category, stamps)| {
            let ids = self.trades.get(category);
            stamps
                .keys()
                .all(|id| ids.is_some_and(|ids| ids.contains(id)))
        })
    }

    /// Remove every entry whose age at `now` is strictly greater than `timeout`.
    ///
    /// An id without a recorded timestamp counts as added at `now` and is kept.
    /// A category without any timestamp map is skipped entirely. Entries
    /// stamped in the future (clock moved backwards) are kept.
    pub fn evict_older_than(&mut self, now: DateTime<Utc>, timeout: Duration) -> Vec<EvictedEntry> {
        let mut evicted = Vec::new();

        for (category, ids) in self.trades.iter_mut() {
            let Some(stamps) = self.timestamps.get_mut(category) else {
                continue;
            };

            ids.retain(|id| {
                let added_at = stamps.get(id).copied().unwrap_or(now);
                let stale = now
                    .signed_duration_since(added_at)
                    .to_std()
                    .is_ok_and(|age| age > timeout);
                if stale {
                    stamps.remove(id);
                    evicted.push(EvictedEntry {
                        category: category.clone(),
                        trade_id: id.clone(),
                        added_at,
                    });
                }
                !stale
            });
        }

        evicted
    }

    /// Release spare capacity. Returns the number of slots freed.
    pub fn shrink_to_fit(&mut self) -> usize {
        let mut freed = shrink_map(&mut self.trades);
        for ids in self.trades.values_mut() {
            let before = ids.capacity();
            ids.shrink_to_fit();
            freed += before.saturating_sub(ids.capacity());
        }

        freed += shrink_map(&mut self.timestamps);
        for stamps in self.timestamps.values_mut() {
            freed += shrink_map(stamps);
        }
        freed
    }
}

fn shrink_map<K: Eq + std::hash::Hash, V>(map: &mut HashMap<K, V>) -> usize {
    let before = map.capacity();
    map.shrink_to_fit();
    before.saturating_sub(map.capacity())
}
