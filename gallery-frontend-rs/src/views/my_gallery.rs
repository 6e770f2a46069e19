use std::rc::Rc;

use chrono::Utc;
use serde_json::{Value, json};
use stash::KeyValueStore;

use crate::api::{Collection, ItemQuery, Transport};
use crate::error::GalleryError;
use crate::list::OptimisticList;
use crate::models::{Artwork, User, Visibility};
use crate::notifications::Notice;
use crate::reconcile::{DeleteOutcome, Reconciler};

/// Create/edit form state. `price` is kept as typed.
#[derive(serde::Serialize, serde::Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtworkDraft {
    pub image_url: String,
    pub title: String,
    pub artist_name: String,
    pub category: String,
    pub medium: String,
    pub description: String,
    pub dimensions: String,
    pub price: String,
    pub visibility: Visibility,
}

impl ArtworkDraft {
    /// An empty form, with the artist prefilled from the user.
    pub fn for_user(user: &User) -> Self {
        ArtworkDraft {
            artist_name: user.name_or_email().to_string(),
            ..Default::default()
        }
    }

    pub fn from_artwork(artwork: &Artwork) -> Self {
        ArtworkDraft {
            image_url: artwork.image_ref().to_string(),
            title: artwork.title.clone(),
            artist_name: artwork.artist_name.clone(),
            category: artwork.category.clone(),
            medium: artwork.medium.clone(),
            description: artwork.description.clone(),
            dimensions: artwork.dimensions.clone(),
            price: artwork.price.map(|p| p.to_string()).unwrap_or_default(),
            visibility: artwork.visibility,
        }
    }

    pub fn validate(&self) -> Result<(), GalleryError> {
        if self.title.trim().is_empty() || self.image_url.trim().is_empty() {
            return Err(GalleryError::Invalid(
                "Title and Image URL are required".to_string(),
            ));
        }
        Ok(())
    }

    /// The JSON body for create and replace. A numeric price is sent as a number, anything else
    /// as typed, and a blank one not at all.
    pub fn payload(&self) -> Value {
        let mut payload = json!({
            "imageUrl": self.image_url.trim(),
            "title": self.title.trim(),
            "artistName": self.artist_name.trim(),
            "category": self.category,
            "medium": self.medium,
            "description": self.description,
            "dimensions": self.dimensions,
            "visibility": self.visibility,
        });

        let price = self.price.trim();
        if !price.is_empty() {
            payload["price"] = price
                .parse::<f64>()
                .ok()
                .and_then(|p| serde_json::Number::from_f64(p).map(Value::Number))
                .unwrap_or_else(|| Value::String(price.to_string()));
        }
        payload
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Option<Artwork>),
    Updated(Option<Artwork>),
    /// The update call failed, but reading the artwork back succeeded.
    UpdatedVerified(Artwork),
}

impl SaveOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            SaveOutcome::Created(_) => Notice::success("Added!", "Artwork added successfully"),
            SaveOutcome::Updated(_) => Notice::success("Updated!", "Artwork updated successfully"),
            SaveOutcome::UpdatedVerified(_) => {
                Notice::success("Updated!", "Artwork updated (verified).")
            }
        }
    }
}

fn decode_artwork(value: Value) -> Option<Artwork> {
    serde_json::from_value::<Artwork>(value)
        .ok()
        .filter(|a| !a.id.is_empty())
}

/// The signed-in user's own artworks, newest first.
pub struct MyGalleryView<T, S> {
    reconciler: Rc<Reconciler<T, S>>,
    artworks: OptimisticList<Artwork>,
}

impl<T: Transport, S: KeyValueStore> MyGalleryView<T, S> {
    pub fn new(reconciler: Rc<Reconciler<T, S>>) -> Self {
        Self {
            reconciler,
            artworks: OptimisticList::default(),
        }
    }

    pub fn artworks(&self) -> Vec<Artwork> {
        self.artworks.to_vec()
    }

    pub async fn load(&self) -> Result<Vec<Artwork>, GalleryError> {
        let user = self.reconciler.session().require_user()?;
        let artworks = self
            .reconciler
            .api()
            .list_items(&ItemQuery::owned_by(&user.email))
            .await?;
        self.artworks.replace(artworks.iter().cloned());
        Ok(artworks)
    }

    /// Delete by `_id`, retrying with the artwork's `itemId` when it has a different one.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, GalleryError> {
        let id = id.trim();
        let fallback = self
            .artworks
            .find(|a| a.id == id)
            .and_then(|a| a.item_id);

        self.reconciler
            .delete(
                Collection::Items,
                id,
                fallback.as_deref(),
                &self.artworks,
                |a| a.id == id,
            )
            .await
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.reconciler.is_deleting(Collection::Items, id.trim())
    }

    /// Create a new artwork, or replace `editing` with the draft. Reloads the list afterwards.
    pub async fn save(
        &self,
        draft: &ArtworkDraft,
        editing: Option<&str>,
    ) -> Result<SaveOutcome, GalleryError> {
        draft.validate()?;

        let outcome = match editing {
            Some(id) => self.update(id.trim(), draft).await?,
            None => self.create(draft).await?,
        };

        if let Err(e) = self.load().await {
            log::warn!("Could not reload gallery after saving: {e}");
        }
        Ok(outcome)
    }

    async fn create(&self, draft: &ArtworkDraft) -> Result<SaveOutcome, GalleryError> {
        let user = self.reconciler.session().require_user()?;

        let mut payload = draft.payload();
        if draft.artist_name.trim().is_empty() {
            payload["artistName"] = json!(user.name_or_email());
        }
        payload["userEmail"] = json!(user.email);
        payload["createdAt"] = json!(Utc::now());

        let created = self.reconciler.api().create_item(payload).await?;
        Ok(SaveOutcome::Created(decode_artwork(created)))
    }

    async fn update(&self, id: &str, draft: &ArtworkDraft) -> Result<SaveOutcome, GalleryError> {
        if id.is_empty() {
            return Err(GalleryError::Invalid("Invalid artwork id".to_string()));
        }

        let api = self.reconciler.api();
        match api.replace_item(id, draft.payload()).await {
            Ok(updated) => Ok(SaveOutcome::Updated(decode_artwork(updated))),
            Err(e) => {
                log::warn!("Replacing artwork {id} failed, checking whether it landed: {e}");
                match api.get_item(id).await {
                    Ok(Some(artwork)) => Ok(SaveOutcome::UpdatedVerified(artwork)),
                    _ => Err(e.into()),
                }
            }
        }
    }
}
