//! # Delta Tracking
//!
//! Network interfaces and drives expose cumulative byte counters. [`DeltaTracker`] remembers the
//! last value seen per key and hands out the growth since then, clamped at zero so that a counter
//! reset or a replaced device never shows up as a negative rate.
//!
//! ```rust
//! use statsbar::tracker::DeltaTracker;
//!
//! let mut tracker: DeltaTracker = DeltaTracker::new();
//! assert_eq!(tracker.next("en0", 1000), 0);
//! assert_eq!(tracker.next("en0", 1500), 500);
//! assert_eq!(tracker.next("en0", 1200), 0);
//! ```

#[cfg(test)]
mod tests;

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Per-key baseline store for cumulative counters.
#[derive(Debug, Clone)]
pub struct DeltaTracker<K = String> {
    previous: HashMap<K, i64>,
}

impl<K> Default for DeltaTracker<K> {
    fn default() -> Self {
        Self { previous: HashMap::new() }
    }
}

impl<K: Eq + Hash> DeltaTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `current` for `key` and return the non-negative growth since the last call.
    ///
    /// The first value seen for a key becomes its baseline and yields 0.
    pub fn next<Q>(&mut self, key: &Q, current: i64) -> i64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        match self.previous.get_mut(key) {
            Some(previous) => {
                let delta = current.saturating_sub(*previous).max(0);
                *previous = current;
                delta
            },
            None => {
                self.previous.insert(key.to_owned(), current);
                0
            },
        }
    }

    /// Baseline currently stored for `key`.
    pub fn baseline<Q>(&self, key: &Q) -> Option<i64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.previous.get(key).copied()
    }

    /// Forget every key not in `live`.
    pub fn evict_missing<Q>(&mut self, live: &HashSet<&Q>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.previous.retain(|key, _| live.contains(<K as Borrow<Q>>::borrow(key)));
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// A pair of trackers for counters that come in two directions, like upload/download.
#[derive(Debug, Clone)]
pub struct DuplexTracker<K = String> {
    first: DeltaTracker<K>,
    second: DeltaTracker<K>,
}

impl<K> Default for DuplexTracker<K> {
    fn default() -> Self {
        Self {
            first: DeltaTracker::default(),
            second: DeltaTracker::default(),
        }
    }
}

impl<K: Eq + Hash> DuplexTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed both counters of `key`; the deltas come back in the same order.
    pub fn next<Q>(&mut self, key: &Q, first: u64, second: u64) -> (i64, i64)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        (
            self.first.next(key, clamp_counter(first)),
            self.second.next(key, clamp_counter(second)),
        )
    }

    pub fn evict_missing<Q>(&mut self, live: &HashSet<&Q>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.first.evict_missing(live);
        self.second.evict_missing(live);
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }
}

fn clamp_counter(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
