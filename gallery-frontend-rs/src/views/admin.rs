use std::rc::Rc;

use stash::KeyValueStore;

use crate::api::{Collection, Transport};
use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::list::OptimisticList;
use crate::models::{Artwork, User};
use crate::reconcile::{DeleteOutcome, Reconciler};

/// Moderation list over `/admin/artworks`, for configured admin emails only.
pub struct AdminView<T, S> {
    reconciler: Rc<Reconciler<T, S>>,
    config: GalleryConfig,
    artworks: OptimisticList<Artwork>,
}

impl<T: Transport, S: KeyValueStore> AdminView<T, S> {
    pub fn new(reconciler: Rc<Reconciler<T, S>>, config: GalleryConfig) -> Self {
        Self {
            reconciler,
            config,
            artworks: OptimisticList::default(),
        }
    }

    pub fn authorize(&self) -> Result<User, GalleryError> {
        let user = self.reconciler.session().require_user()?;
        if !self.config.is_admin(&user.email) {
            log::warn!("{} tried to open the admin pages", user.email);
            return Err(GalleryError::NotAuthorized);
        }
        Ok(user)
    }

    pub fn artworks(&self) -> Vec<Artwork> {
        self.artworks.to_vec()
    }

    pub async fn load(&self) -> Result<Vec<Artwork>, GalleryError> {
        self.authorize()?;
        let artworks = self.reconciler.api().list_admin_artworks().await?;
        self.artworks.replace(artworks.iter().cloned());
        Ok(artworks)
    }

    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, GalleryError> {
        self.authorize()?;
        let id = id.trim();
        let fallback = self
            .artworks
            .find(|a| a.id == id)
            .and_then(|a| a.item_id);

        self.reconciler
            .delete(
                Collection::AdminArtworks,
                id,
                fallback.as_deref(),
                &self.artworks,
                |a| a.id == id,
            )
            .await
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.reconciler
            .is_deleting(Collection::AdminArtworks, id.trim())
    }
}
