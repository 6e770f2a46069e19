//! Optimistic mutations against a backend whose capabilities are not known in advance.
//!
//! Every operation follows the same shape: update what the user sees first, then try the server,
//! then fall back to browser storage if the server cannot be reached, and only roll the screen
//! back when leaving it as-is would hide real data.
//!
//! - **Like**: render `+1` immediately. Read the canonical artwork, then try each
//!   [`LikeStrategy`] in order until one succeeds. If the read or every strategy fails, the like
//!   is kept as a local delta. A like is never visually un-applied.
//! - **Favorite**: needs a session. One create call; a conflict means it already exists. Any
//!   other failure queues it locally.
//! - **Delete**: remove from the list immediately. Try the primary id, then the fallback id.
//!   "Not found" counts as done. If everything fails the item comes back.
//!
//! Each operation holds a per-entity in-flight marker for its whole duration, so a second call
//! for the same entity is refused rather than interleaved.
//!
//! Pending like deltas are cleared whenever a strategy that writes an absolute count succeeds:
//! that count was computed from the displayed value, which already included them. After the
//! increment-only route succeeds they are kept, since the server only added one.
use chokepoint::ChokePoint;
use chrono::Utc;
use serde_json::{Value, json};
use stash::KeyValueStore;

use crate::api::{ApiClient, Collection, Transport};
use crate::error::{ApiError, GalleryError};
use crate::fallback::LocalFallback;
use crate::list::OptimisticList;
use crate::models::{Artwork, Favorite};
use crate::notifications::{AppEvent, AppEvents, Notice};
use crate::session::SessionContext;

/// Ways of telling the backend about one more like, most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeStrategy {
    /// `PUT` the canonical artwork with the new count.
    ReplaceItem,
    /// `PATCH` just `{likes}`.
    PatchLikes,
    /// `POST /items/{id}/like`.
    LikeEndpoint,
}

pub const LIKE_STRATEGIES: [LikeStrategy; 3] = [
    LikeStrategy::ReplaceItem,
    LikeStrategy::PatchLikes,
    LikeStrategy::LikeEndpoint,
];

impl LikeStrategy {
    /// Whether the strategy sends the full count (as opposed to asking the server to add one).
    pub fn writes_absolute_count(&self) -> bool {
        !matches!(self, LikeStrategy::LikeEndpoint)
    }

    async fn apply<T: Transport>(
        &self,
        api: &ApiClient<T>,
        id: &str,
        canonical: &Value,
        likes: u64,
    ) -> Result<Value, ApiError> {
        match self {
            LikeStrategy::ReplaceItem => {
                let mut replacement = canonical.clone();
                match replacement.as_object_mut() {
                    Some(fields) => {
                        fields.insert("likes".to_string(), json!(likes));
                    }
                    None => replacement = json!({ "likes": likes }),
                }
                api.replace_item(id, replacement).await
            }
            LikeStrategy::PatchLikes => api.patch_item(id, json!({ "likes": likes })).await,
            LikeStrategy::LikeEndpoint => api.like_item(id).await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LikeSync {
    /// The server accepted the like.
    Confirmed(LikeStrategy),
    /// The server could not be updated; the like lives in the local delta log.
    SavedLocally { pending: u32 },
    /// Neither the server nor local storage took it. The count on screen still stands.
    Unsaved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LikeOutcome {
    /// The count that was rendered last.
    pub likes: u64,
    /// A fresh copy of the artwork, when the server could be re-read after confirming.
    pub refreshed: Option<Artwork>,
    pub sync: LikeSync,
}

impl LikeOutcome {
    pub fn notice(&self) -> Notice {
        match self.sync {
            LikeSync::Confirmed(_) => Notice::success("Liked!", "You liked this artwork."),
            LikeSync::SavedLocally { .. } => Notice::info(
                "Saved locally",
                "Like saved locally (couldn't update server).",
            ),
            LikeSync::Unsaved => Notice::warning(
                "Not saved",
                "Your like is shown but could not be saved.",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FavoriteOutcome {
    Saved(Favorite),
    AlreadySaved,
    SavedLocally(Favorite),
}

impl FavoriteOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            FavoriteOutcome::Saved(_) => Notice::success("Saved!", "Added to your favorites."),
            FavoriteOutcome::AlreadySaved => {
                Notice::info("Already saved", "This item is already in your favorites.")
            }
            FavoriteOutcome::SavedLocally(_) => {
                Notice::info("Saved locally", "Favorite saved in your browser.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server deleted it, keyed by `via`.
    Removed { via: String },
    /// The server no longer had it.
    AlreadyRemoved,
    /// It only ever existed in this browser's queue.
    RemovedLocally,
}

impl DeleteOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            DeleteOutcome::Removed { .. } => Notice::success("Removed", "It has been removed."),
            DeleteOutcome::AlreadyRemoved => Notice::info("Removed", "Already removed (synced)."),
            DeleteOutcome::RemovedLocally => {
                Notice::success("Removed", "Removed from this browser.")
            }
        }
    }
}

pub struct Reconciler<T, S> {
    api: ApiClient<T>,
    fallback: LocalFallback<S>,
    session: SessionContext,
    events: AppEvents,
    liking: ChokePoint<String>,
    favoriting: ChokePoint<String>,
    deleting: ChokePoint<(Collection, String)>,
}

impl<T, S> Reconciler<T, S> {
    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    pub fn fallback(&self) -> &LocalFallback<S> {
        &self.fallback
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn events(&self) -> &AppEvents {
        &self.events
    }
}

impl<T: Transport, S: KeyValueStore> Reconciler<T, S> {
    pub fn new(
        api: ApiClient<T>,
        fallback: LocalFallback<S>,
        session: SessionContext,
        events: AppEvents,
    ) -> Self {
        Self {
            api,
            fallback,
            session,
            events,
            liking: ChokePoint::new(),
            favoriting: ChokePoint::new(),
            deleting: ChokePoint::new(),
        }
    }

    pub fn is_liking(&self, artwork_id: &str) -> bool {
        self.liking.is_in_flight(&artwork_id.to_string())
    }

    pub fn is_favoriting(&self, artwork_id: &str) -> bool {
        self.favoriting.is_in_flight(&artwork_id.to_string())
    }

    pub fn is_deleting(&self, collection: Collection, id: &str) -> bool {
        self.deleting.is_in_flight(&(collection, id.to_string()))
    }

    /// `artwork.likes` is the count currently on screen. `render` is called with the optimistic
    /// count before anything is awaited, and again if the server reports a different one.
    pub async fn like(
        &self,
        artwork: &Artwork,
        render: impl Fn(u64),
    ) -> Result<LikeOutcome, GalleryError> {
        let id = artwork.id.trim();
        if id.is_empty() {
            return Err(GalleryError::Invalid("Invalid item id".to_string()));
        }
        let _pass = self
            .liking
            .try_acquire(id.to_string())
            .ok_or_else(|| GalleryError::InFlight(id.to_string()))?;

        let optimistic = artwork.likes.saturating_add(1);
        render(optimistic);

        let canonical = match self.api.fetch_item_value(id).await {
            Ok(value) if !value.is_null() => value,
            Ok(_) => serde_json::to_value(artwork).unwrap_or_else(|_| json!({})),
            Err(e) => {
                log::warn!("Could not read artwork {id} before liking: {e}");
                return Ok(self.keep_like_locally(id, optimistic));
            }
        };

        for strategy in LIKE_STRATEGIES {
            match strategy.apply(&self.api, id, &canonical, optimistic).await {
                Ok(_) => {
                    log::info!("Like on {id} confirmed via {strategy:?}");
                    if strategy.writes_absolute_count() {
                        if let Err(e) = self.fallback.clear_like_delta(id) {
                            log::warn!("Could not clear pending likes for {id}: {e}");
                        }
                    }
                    return Ok(self.confirm_like(id, optimistic, strategy, render).await);
                }
                Err(e) => log::warn!("{strategy:?} failed for {id}: {e}"),
            }
        }

        Ok(self.keep_like_locally(id, optimistic))
    }

    async fn confirm_like(
        &self,
        id: &str,
        optimistic: u64,
        strategy: LikeStrategy,
        render: impl Fn(u64),
    ) -> LikeOutcome {
        let refreshed = match self.api.get_item(id).await {
            Ok(Some(mut artwork)) => {
                // an absolute write already carries the pending likes, even if clearing them failed
                if !strategy.writes_absolute_count() {
                    let pending = u64::from(self.fallback.read_like_delta(id));
                    artwork.likes = artwork.likes.saturating_add(pending);
                }
                Some(artwork)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Could not re-read artwork {id} after liking: {e}");
                None
            }
        };

        let likes = refreshed.as_ref().map_or(optimistic, |a| a.likes);
        if likes != optimistic {
            render(likes);
        }

        LikeOutcome {
            likes,
            refreshed,
            sync: LikeSync::Confirmed(strategy),
        }
    }

    fn keep_like_locally(&self, id: &str, optimistic: u64) -> LikeOutcome {
        let sync = match self.fallback.record_like_delta(id) {
            Ok(pending) => LikeSync::SavedLocally { pending },
            Err(e) => {
                log::error!("Could not save like on {id} locally: {e}");
                LikeSync::Unsaved
            }
        };
        LikeOutcome {
            likes: optimistic,
            refreshed: None,
            sync,
        }
    }

    pub async fn favorite(&self, artwork: &Artwork) -> Result<FavoriteOutcome, GalleryError> {
        let user = self.session.require_user()?;
        let id = artwork.id.trim();
        if id.is_empty() {
            return Err(GalleryError::Invalid("Invalid item id".to_string()));
        }
        let _pass = self
            .favoriting
            .try_acquire(id.to_string())
            .ok_or_else(|| GalleryError::InFlight(id.to_string()))?;

        let payload = Favorite::for_artwork(artwork, &user, Utc::now());

        match self.api.create_favorite(&payload).await {
            Ok(created) => {
                let favorite = created.unwrap_or(payload);
                self.events.emit(&AppEvent::FavoriteAdded(favorite.clone()));
                Ok(FavoriteOutcome::Saved(favorite))
            }
            Err(e) if e.is_conflict() => {
                log::info!("{id} is already a favorite of {}", user.email);
                Ok(FavoriteOutcome::AlreadySaved)
            }
            Err(e) => {
                log::warn!("Could not create favorite for {id}, queueing locally: {e}");
                self.fallback.record_favorite(&payload)?;
                self.events.emit(&AppEvent::FavoriteAdded(payload.clone()));
                Ok(FavoriteOutcome::SavedLocally(payload))
            }
        }
    }

    /// Remove the items matching `is_target` from `list` right away, then delete `primary` (or
    /// `fallback` if `primary` is blank or fails for a reason other than "not found") from
    /// `collection`. Restores the items if no attempt succeeds.
    pub async fn delete<I: Clone>(
        &self,
        collection: Collection,
        primary: &str,
        fallback: Option<&str>,
        list: &OptimisticList<I>,
        is_target: impl Fn(&I) -> bool,
    ) -> Result<DeleteOutcome, GalleryError> {
        let primary = primary.trim();
        let fallback = fallback
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != primary);
        let attempts: Vec<&str> = Some(primary)
            .filter(|id| !id.is_empty())
            .into_iter()
            .chain(fallback)
            .collect();

        let Some(key) = attempts.first() else {
            return Err(GalleryError::Invalid("Invalid id".to_string()));
        };
        let _pass = self
            .deleting
            .try_acquire((collection, key.to_string()))
            .ok_or_else(|| GalleryError::InFlight(key.to_string()))?;

        let removal = list.remove_where(is_target);

        let mut last_error = None;
        for id in &attempts {
            match self.api.delete(collection, id).await {
                Ok(_) => {
                    log::info!("Deleted {id} from {collection:?}");
                    return Ok(DeleteOutcome::Removed { via: id.to_string() });
                }
                Err(e) if e.is_not_found() => {
                    log::info!("{id} was already gone from {collection:?}");
                    return Ok(DeleteOutcome::AlreadyRemoved);
                }
                Err(e) => {
                    log::warn!("Deleting {id} from {collection:?} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        list.rollback(removal);
        Err(last_error
            .map(GalleryError::Api)
            .unwrap_or_else(|| GalleryError::Invalid("Invalid id".to_string())))
    }
}
