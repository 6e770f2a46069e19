//! Per-key "in flight" markers.
//!
//! A [`ChokePoint`] lets at most one operation per key run at a time. Callers ask for a [`Pass`]
//! before starting; if another pass for the same key is still alive the request is refused
//! instead of queued. Dropping the pass clears the marker, so every exit path of an async
//! sequence (early return, `?`, panic unwinding) releases the key.
use dashmap::DashSet;
use std::hash::Hash;
use std::sync::Arc;

pub struct ChokePoint<K: Eq + Hash> {
    in_flight: Arc<DashSet<K>>,
}

impl<K> ChokePoint<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashSet::new()),
        }
    }

    /// Mark `key` as in flight. Returns `None` if it already is.
    pub fn try_acquire(&self, key: K) -> Option<Pass<K>> {
        if !self.in_flight.insert(key.clone()) {
            return None;
        }

        Some(Pass {
            key,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains(key)
    }

    /// Number of keys currently in flight.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}

impl<K> Default for ChokePoint<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the holder owns the in-flight marker for `key`.
#[must_use = "the key is released as soon as the pass is dropped"]
pub struct Pass<K: Eq + Hash> {
    key: K,
    in_flight: Arc<DashSet<K>>,
}

impl<K: Eq + Hash> Pass<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for Pass<K> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}
