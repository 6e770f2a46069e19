//! Wire types shared with the backend and with JavaScript.
//!
//! The backend is loosely typed: counts arrive as numbers or numeric strings, ids as strings or
//! numbers, and timestamps in whatever shape the writer used. Decoding is lenient so that one
//! odd field does not make a whole artwork disappear from a list.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Serialize, Deserialize, tsify::Tsify, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    #[default]
    #[serde(other)]
    Public,
}

#[derive(Serialize, Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    /// Older records used `image` instead of `imageUrl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub artist_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dimensions: String,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, deserialize_with = "lenient_count")]
    pub likes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Secondary reference some records carry; deletes fall back to it.
    #[serde(
        default,
        deserialize_with = "lenient_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    #[tsify(type = "string", optional)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Artwork {
    pub fn image_ref(&self) -> &str {
        if !self.image_url.is_empty() {
            return &self.image_url;
        }
        self.image.as_deref().unwrap_or_default()
    }

    pub fn artist_or_unknown(&self) -> &str {
        let name = self.artist_name.trim();
        if name.is_empty() {
            "Unknown Artist"
        } else {
            name
        }
    }
}

#[derive(Serialize, Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Absent when the favorite only exists in the local queue.
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "lenient_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub item_id: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    #[tsify(type = "string", optional)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Favorite {
    pub fn for_artwork(artwork: &Artwork, user: &User, now: DateTime<Utc>) -> Self {
        Favorite {
            id: None,
            item_id: artwork.id.clone(),
            user_email: user.email.clone(),
            image_url: artwork.image_ref().to_string(),
            title: artwork.title.clone(),
            created_at: Some(now),
        }
    }

    /// Favorites are unique per (artwork, owner).
    pub fn same_slot(&self, other: &Favorite) -> bool {
        self.item_id == other.item_id && self.user_email == other.user_email
    }
}

/// A favorite with its artwork resolved, or `None` if the artwork could not be loaded.
#[derive(Serialize, Deserialize, tsify::Tsify, Debug, Clone, PartialEq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub favorite: Favorite,
    pub artwork: Option<Artwork>,
    /// Only present in this browser's queue, not confirmed by the server.
    pub local_only: bool,
}

impl FavoriteEntry {
    pub fn title(&self) -> &str {
        let from_artwork = self.artwork.as_ref().map(|a| a.title.as_str());
        [from_artwork, Some(self.favorite.title.as_str())]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or("Untitled")
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.artwork.as_ref().map(Artwork::image_ref)
    }

    pub fn placeholder_label(&self) -> &str {
        if self.favorite.title.is_empty() {
            "Artwork unavailable"
        } else {
            &self.favorite.title
        }
    }

    pub fn category_label(&self) -> String {
        match self.artwork.as_ref().map(|a| a.category.as_str()) {
            Some(category) if !category.is_empty() => format!("Category: {category}"),
            _ => "Category: N/A".to_string(),
        }
    }

    /// The id used for in-flight bookkeeping and list keys.
    pub fn key(&self) -> &str {
        match &self.favorite.id {
            Some(id) if !id.is_empty() => id,
            _ => &self.favorite.item_id,
        }
    }
}

/// The only fields of the identity provider's user object this app depends on.
#[derive(Serialize, Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Eq, Default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct User {
    pub email: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default)]
    pub photo_url: Option<String>,
}

impl User {
    pub fn name_or_email(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_id(deserializer)?.unwrap_or_default())
}

fn lenient_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Mongo extended JSON
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    Ok(id.filter(|id| !id.is_empty()))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| *f > 0.0).map(|f| f as u64),
        _ => None,
    };
    Ok(count.unwrap_or(0))
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artwork_decodes_loose_fields() {
        let artwork: Artwork = serde_json::from_value(json!({
            "_id": 42,
            "title": "Dusk",
            "image": "https://img.test/dusk.png",
            "likes": "7",
            "price": "120.5",
            "visibility": "unlisted",
            "createdAt": "not a date",
        }))
        .unwrap();

        assert_eq!(artwork.id, "42");
        assert_eq!(artwork.image_ref(), "https://img.test/dusk.png");
        assert_eq!(artwork.likes, 7);
        assert_eq!(artwork.price, Some(120.5));
        assert_eq!(artwork.visibility, Visibility::Public);
        assert_eq!(artwork.created_at, None);
    }

    #[test]
    fn test_visibility_wire_names() {
        let private: Visibility = serde_json::from_value(json!("private")).unwrap();
        assert_eq!(private, Visibility::Private);
        let unknown: Visibility = serde_json::from_value(json!("unlisted")).unwrap();
        assert_eq!(unknown, Visibility::Public);
        assert_eq!(serde_json::to_value(Visibility::Private).unwrap(), json!("private"));
        assert_eq!(serde_json::to_value(Visibility::default()).unwrap(), json!("public"));
    }

    #[test]
    fn test_artwork_negative_likes_clamp_to_zero() {
        let artwork: Artwork = serde_json::from_value(json!({"_id": "a1", "likes": -3})).unwrap();
        assert_eq!(artwork.likes, 0);
    }

    #[test]
    fn test_image_url_wins_over_legacy_image() {
        let artwork: Artwork = serde_json::from_value(json!({
            "imageUrl": "new.png",
            "image": "old.png",
        }))
        .unwrap();
        assert_eq!(artwork.image_ref(), "new.png");
    }

    #[test]
    fn test_mongo_object_id() {
        let favorite: Favorite = serde_json::from_value(json!({
            "_id": {"$oid": "65f0c0ffee"},
            "itemId": "a1",
            "userEmail": "ana@example.com",
            "createdAt": "2025-03-01T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(favorite.id.as_deref(), Some("65f0c0ffee"));
        assert!(favorite.created_at.is_some());
    }

    #[test]
    fn test_queued_favorite_wire_shape() {
        let user = User {
            email: "ana@example.com".into(),
            ..Default::default()
        };
        let artwork = Artwork {
            id: "a1".into(),
            title: "Dusk".into(),
            image_url: "dusk.png".into(),
            ..Default::default()
        };
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let value = serde_json::to_value(Favorite::for_artwork(&artwork, &user, now)).unwrap();
        assert_eq!(
            value,
            json!({
                "itemId": "a1",
                "userEmail": "ana@example.com",
                "imageUrl": "dusk.png",
                "title": "Dusk",
                "createdAt": "2023-11-14T22:13:20Z",
            })
        );
    }

    #[test]
    fn test_degraded_favorite_entry() {
        let entry = FavoriteEntry {
            favorite: Favorite {
                item_id: "gone".into(),
                ..Default::default()
            },
            artwork: None,
            local_only: false,
        };

        assert_eq!(entry.title(), "Untitled");
        assert_eq!(entry.placeholder_label(), "Artwork unavailable");
        assert_eq!(entry.category_label(), "Category: N/A");
        assert_eq!(entry.key(), "gone");
    }

    #[test]
    fn test_user_name_falls_back_to_email() {
        let user: User = serde_json::from_value(json!({
            "email": "ana@example.com",
            "displayName": "  ",
            "photoURL": null,
        }))
        .unwrap();
        assert_eq!(user.name_or_email(), "ana@example.com");
    }
}
