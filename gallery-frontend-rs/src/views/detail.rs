use std::{cell::RefCell, rc::Rc};

use stash::KeyValueStore;

use crate::api::Transport;
use crate::error::GalleryError;
use crate::models::Artwork;
use crate::reconcile::{FavoriteOutcome, LikeOutcome, Reconciler};

pub struct ArtworkDetail<T, S> {
    reconciler: Rc<Reconciler<T, S>>,
    artwork: RefCell<Option<Artwork>>,
}

impl<T: Transport, S: KeyValueStore> ArtworkDetail<T, S> {
    pub fn new(reconciler: Rc<Reconciler<T, S>>) -> Self {
        Self {
            reconciler,
            artwork: RefCell::new(None),
        }
    }

    pub fn artwork(&self) -> Option<Artwork> {
        self.artwork.borrow().clone()
    }

    /// Fetch the artwork and show its likes including any that are only saved locally.
    pub async fn load(&self, id: &str) -> Result<Artwork, GalleryError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(GalleryError::Invalid("Invalid item id".to_string()));
        }

        let mut artwork = self
            .reconciler
            .api()
            .get_item(id)
            .await?
            .ok_or_else(|| GalleryError::NotFound(id.to_string()))?;
        let pending = u64::from(self.reconciler.fallback().read_like_delta(id));
        artwork.likes = artwork.likes.saturating_add(pending);

        *self.artwork.borrow_mut() = Some(artwork.clone());
        Ok(artwork)
    }

    pub async fn like(&self) -> Result<LikeOutcome, GalleryError> {
        self.like_with(|_| {}).await
    }

    /// Like, reporting every count the page should show to `on_render` as it changes.
    pub async fn like_with(&self, on_render: impl Fn(u64)) -> Result<LikeOutcome, GalleryError> {
        let artwork = self.loaded()?;
        let outcome = self
            .reconciler
            .like(&artwork, |likes| {
                self.set_likes(likes);
                on_render(likes);
            })
            .await?;

        if let Some(refreshed) = &outcome.refreshed {
            *self.artwork.borrow_mut() = Some(refreshed.clone());
        }
        Ok(outcome)
    }

    pub async fn favorite(&self) -> Result<FavoriteOutcome, GalleryError> {
        let artwork = self.loaded()?;
        self.reconciler.favorite(&artwork).await
    }

    pub fn is_liking(&self) -> bool {
        self.current_id()
            .is_some_and(|id| self.reconciler.is_liking(&id))
    }

    pub fn is_favoriting(&self) -> bool {
        self.current_id()
            .is_some_and(|id| self.reconciler.is_favoriting(&id))
    }

    fn current_id(&self) -> Option<String> {
        self.artwork.borrow().as_ref().map(|a| a.id.clone())
    }

    fn loaded(&self) -> Result<Artwork, GalleryError> {
        self.artwork()
            .ok_or_else(|| GalleryError::Invalid("Artwork is not loaded yet".to_string()))
    }

    fn set_likes(&self, likes: u64) {
        if let Some(artwork) = self.artwork.borrow_mut().as_mut() {
            artwork.likes = likes;
        }
    }
}
