use std::{cell::Cell, rc::Rc};

use futures::future::join_all;
use stash::KeyValueStore;

use crate::api::{Collection, Transport};
use crate::error::GalleryError;
use crate::list::OptimisticList;
use crate::models::{Artwork, Favorite, FavoriteEntry};
use crate::notifications::{AppEvent, ListenerKey};
use crate::reconcile::{DeleteOutcome, Reconciler};

/// The signed-in user's favorites, including ones only queued in this browser.
///
/// While attached, favorites created anywhere else in the app are appended as they happen.
pub struct FavoritesView<T, S> {
    reconciler: Rc<Reconciler<T, S>>,
    entries: OptimisticList<FavoriteEntry>,
    subscription: Cell<Option<ListenerKey>>,
}

impl<T: Transport, S: KeyValueStore> FavoritesView<T, S> {
    pub fn new(reconciler: Rc<Reconciler<T, S>>) -> Self {
        Self {
            reconciler,
            entries: OptimisticList::default(),
            subscription: Cell::new(None),
        }
    }

    pub fn entries(&self) -> Vec<FavoriteEntry> {
        self.entries.to_vec()
    }

    pub async fn load(&self) -> Result<Vec<FavoriteEntry>, GalleryError> {
        let user = self.reconciler.session().require_user()?;
        let remote = self.reconciler.api().list_favorites(&user.email).await?;

        let queued: Vec<Favorite> = self
            .reconciler
            .fallback()
            .favorites_for(&user.email)
            .into_iter()
            .filter(|local| !remote.iter().any(|f| f.same_slot(local)))
            .collect();

        let pending = remote
            .into_iter()
            .map(|f| (f, false))
            .chain(queued.into_iter().map(|f| (f, true)));
        let entries = join_all(pending.map(|(favorite, local_only)| async move {
            let artwork = self.resolve(&favorite.item_id).await;
            FavoriteEntry {
                favorite,
                artwork,
                local_only,
            }
        }))
        .await;

        self.entries.replace(entries.iter().cloned());
        Ok(entries)
    }

    async fn resolve(&self, item_id: &str) -> Option<Artwork> {
        if item_id.is_empty() {
            return None;
        }
        self.reconciler
            .api()
            .get_item(item_id)
            .await
            .inspect_err(|e| log::warn!("Could not resolve favorited artwork {item_id}: {e}"))
            .ok()
            .flatten()
    }

    /// Remove by record id, falling back to the artwork id. Queued-only entries are dropped from
    /// local storage without a network call.
    pub async fn remove(
        &self,
        record_id: Option<&str>,
        item_id: &str,
    ) -> Result<DeleteOutcome, GalleryError> {
        let user = self.reconciler.session().require_user()?;
        let record_id = record_id.map(str::trim).filter(|id| !id.is_empty());
        let item_id = item_id.trim();

        let Some(record_id) = record_id else {
            if item_id.is_empty() {
                return Err(GalleryError::Invalid("Invalid id".to_string()));
            }
            let _removal = self
                .entries
                .remove_where(|e| e.favorite.id.is_none() && e.favorite.item_id == item_id);
            self.reconciler
                .fallback()
                .forget_favorite(item_id, &user.email)?;
            return Ok(DeleteOutcome::RemovedLocally);
        };

        let outcome = self
            .reconciler
            .delete(
                Collection::Favorites,
                record_id,
                Some(item_id),
                &self.entries,
                |e| {
                    e.favorite.id.as_deref() == Some(record_id)
                        || (!item_id.is_empty() && e.favorite.item_id == item_id)
                },
            )
            .await?;

        if let Err(e) = self
            .reconciler
            .fallback()
            .forget_favorite(item_id, &user.email)
        {
            log::warn!("Could not drop queued copy of favorite {item_id}: {e}");
        }
        Ok(outcome)
    }

    pub fn is_removing(&self, record_id: &str) -> bool {
        self.reconciler
            .is_deleting(Collection::Favorites, record_id.trim())
    }

    /// Start appending favorites added elsewhere. Idempotent.
    pub fn attach(&self) {
        if self.subscription.get().is_some() {
            return;
        }

        let entries = self.entries.clone();
        let session = self.reconciler.session().clone();
        let key = self.reconciler.events().subscribe(move |event| match event {
            AppEvent::FavoriteAdded(favorite) => {
                let mine = session
                    .user()
                    .is_some_and(|u| u.email == favorite.user_email);
                if !mine || entries.any(|e| e.favorite.same_slot(favorite)) {
                    return;
                }
                entries.push_back(FavoriteEntry {
                    favorite: favorite.clone(),
                    artwork: None,
                    local_only: favorite.id.is_none(),
                });
            }
        });
        self.subscription.set(Some(key));
    }

    pub fn detach(&self) {
        if let Some(key) = self.subscription.take() {
            self.reconciler.events().unsubscribe(key);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.get().is_some()
    }
}

impl<T, S> Drop for FavoritesView<T, S> {
    fn drop(&mut self) {
        if let Some(key) = self.subscription.take() {
            self.reconciler.events().unsubscribe(key);
        }
    }
}
