//! Mutations the backend did not confirm, kept in browser storage.
//!
//! Two independent records:
//! - `local_likes`: artwork id -> number of likes applied locally but never confirmed. Only ever
//!   used as an addend on top of the server's count when rendering; never replayed to the server.
//! - `local_favorites`: favorites that could not be created remotely, unique per
//!   (artwork, owner).
use std::collections::BTreeMap;

use chrono::Utc;
use stash::{KeyValueStore, Record};

use crate::models::Favorite;

const LIKE_DELTAS: Record<BTreeMap<String, u32>> = Record::new("local_likes");
const QUEUED_FAVORITES: Record<Vec<Favorite>> = Record::new("local_favorites");

pub struct LocalFallback<S> {
    store: S,
}

impl<S: KeyValueStore> LocalFallback<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add one pending like. Returns the new pending total for the artwork.
    pub fn record_like_delta(&self, artwork_id: &str) -> Result<u32, stash::Error> {
        LIKE_DELTAS.update(&self.store, |deltas| {
            let delta = deltas.entry(artwork_id.to_string()).or_insert(0);
            *delta = delta.saturating_add(1);
            *delta
        })
    }

    pub fn read_like_delta(&self, artwork_id: &str) -> u32 {
        LIKE_DELTAS
            .load(&self.store)
            .get(artwork_id)
            .copied()
            .unwrap_or(0)
    }

    /// Forget pending likes for an artwork once the server has absorbed them.
    pub fn clear_like_delta(&self, artwork_id: &str) -> Result<(), stash::Error> {
        if self.read_like_delta(artwork_id) == 0 {
            return Ok(());
        }
        LIKE_DELTAS.update(&self.store, |deltas| {
            deltas.remove(artwork_id);
        })
    }

    /// Queue a favorite unless one for the same (artwork, owner) is already queued.
    /// Returns whether anything was added.
    pub fn record_favorite(&self, favorite: &Favorite) -> Result<bool, stash::Error> {
        let mut queued = QUEUED_FAVORITES.load(&self.store);
        if queued.iter().any(|f| f.same_slot(favorite)) {
            return Ok(false);
        }

        let mut favorite = favorite.clone();
        favorite.id = None;
        favorite.created_at.get_or_insert_with(Utc::now);
        queued.push(favorite);

        QUEUED_FAVORITES.save(&self.store, &queued)?;
        Ok(true)
    }

    pub fn list_favorites(&self) -> Vec<Favorite> {
        QUEUED_FAVORITES.load(&self.store)
    }

    pub fn favorites_for(&self, user_email: &str) -> Vec<Favorite> {
        self.list_favorites()
            .into_iter()
            .filter(|f| f.user_email == user_email)
            .collect()
    }

    /// Drop a queued favorite. Returns whether one was removed.
    pub fn forget_favorite(&self, item_id: &str, user_email: &str) -> Result<bool, stash::Error> {
        let mut queued = QUEUED_FAVORITES.load(&self.store);
        let before = queued.len();
        queued.retain(|f| !(f.item_id == item_id && f.user_email == user_email));
        if queued.len() == before {
            return Ok(false);
        }
        QUEUED_FAVORITES.save(&self.store, &queued)?;
        Ok(true)
    }
}
