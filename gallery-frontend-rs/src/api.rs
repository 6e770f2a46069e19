//! JSON-over-HTTP adapter for the gallery backend.
//!
//! [`ApiClient::fetch`] is the single choke point every request goes through: it resolves the
//! path against the configured base, parses whatever came back, and turns failures into
//! [`ApiError`]. It never retries; fallbacks are the caller's business.
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::error::ApiError;
use crate::models::{Artwork, Favorite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub text: String,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Something that can put an [`HttpRequest`] on the wire.
///
/// `Err` means no HTTP response was produced at all; the string is the underlying cause.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Backend collections that support `DELETE /<collection>/<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Favorites,
    AdminArtworks,
}

impl Collection {
    fn segments(&self) -> &'static [&'static str] {
        match self {
            Collection::Items => &["items"],
            Collection::Favorites => &["favorites"],
            Collection::AdminArtworks => &["admin", "artworks"],
        }
    }
}

/// Filters for `GET /items`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub user_email: Option<String>,
    pub sort: Option<&'static str>,
}

impl ItemQuery {
    /// One owner's artworks, newest first.
    pub fn owned_by(email: &str) -> Self {
        ItemQuery {
            user_email: Some(email.to_string()),
            sort: Some("createdAt_desc"),
        }
    }

    fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(email) = &self.user_email {
            pairs.push(("userEmail", email.as_str()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort));
        }
        pairs
    }
}

/// Parse a response body. Empty bodies become `{}`, non-JSON bodies become `{"_raw": text}`.
pub fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "_raw": text }))
}

/// The backend answers either with the bare entity or with `{ "data": entity }`.
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

fn is_empty_entity(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty() || map.contains_key("_raw"),
        _ => false,
    }
}

fn decode_list<T: DeserializeOwned>(body: Value, what: &'static str) -> Result<Vec<T>, ApiError> {
    let Value::Array(elements) = unwrap_data(body) else {
        return Err(ApiError::Decode {
            what,
            reason: "expected a list".to_string(),
        });
    };

    Ok(elements
        .into_iter()
        .filter_map(|element| {
            serde_json::from_value(element)
                .inspect_err(|e| log::warn!("Skipping malformed element in {what}: {e}"))
                .ok()
        })
        .collect())
}

pub struct ApiClient<T> {
    transport: T,
    base: Url,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, base: &str) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidBase {
            base: base.to_string(),
            reason,
        };
        let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("URL cannot have path segments".to_string()));
        }
        Ok(Self { transport, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URLs pass through; anything else is appended to the base.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http") {
            return path.to_string();
        }
        format!("{}{path}", self.base.as_str().trim_end_matches('/'))
    }

    /// Perform a request and return the parsed body.
    pub async fn fetch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.resolve(path);
        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: url.clone(),
                body,
            })
            .await
            .map_err(|cause| {
                log::error!("{method} {url} failed before a response: {cause}");
                ApiError::Network { cause }
            })?;

        log::debug!("{method} {url} -> {}", response.status);

        let body = parse_body(&response.text);
        if !response.ok() {
            return Err(ApiError::request(response.status, body));
        }
        Ok(body)
    }

    /// URL for `segments` below the base, each one percent-encoded.
    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url.into()
    }

    fn item_url(&self, id: &str) -> String {
        self.endpoint(&["items", id], &[])
    }

    /// The raw artwork object, with any `{data}` wrapper removed.
    pub async fn fetch_item_value(&self, id: &str) -> Result<Value, ApiError> {
        let body = self.fetch(HttpMethod::Get, &self.item_url(id), None).await?;
        Ok(unwrap_data(body))
    }

    pub async fn get_item(&self, id: &str) -> Result<Option<Artwork>, ApiError> {
        let value = self.fetch_item_value(id).await?;
        if is_empty_entity(&value) {
            return Ok(None);
        }
        let artwork: Artwork = serde_json::from_value(value).map_err(|e| ApiError::Decode {
            what: "artwork",
            reason: e.to_string(),
        })?;
        Ok(Some(artwork).filter(|a| !a.id.is_empty()))
    }

    pub async fn list_items(&self, query: &ItemQuery) -> Result<Vec<Artwork>, ApiError> {
        let url = self.endpoint(&["items"], &query.pairs());
        let body = self.fetch(HttpMethod::Get, &url, None).await?;
        decode_list(body, "artworks")
    }

    pub async fn create_item(&self, payload: Value) -> Result<Value, ApiError> {
        let url = self.endpoint(&["items"], &[]);
        let body = self.fetch(HttpMethod::Post, &url, Some(payload)).await?;
        Ok(unwrap_data(body))
    }

    /// `PUT`: the payload replaces the whole artwork.
    pub async fn replace_item(&self, id: &str, payload: Value) -> Result<Value, ApiError> {
        let body = self
            .fetch(HttpMethod::Put, &self.item_url(id), Some(payload))
            .await?;
        Ok(unwrap_data(body))
    }

    /// `PATCH`: only the fields present in the payload change.
    pub async fn patch_item(&self, id: &str, payload: Value) -> Result<Value, ApiError> {
        let body = self
            .fetch(HttpMethod::Patch, &self.item_url(id), Some(payload))
            .await?;
        Ok(unwrap_data(body))
    }

    /// The dedicated increment route, where the backend has one.
    pub async fn like_item(&self, id: &str) -> Result<Value, ApiError> {
        let url = self.endpoint(&["items", id, "like"], &[]);
        let body = self.fetch(HttpMethod::Post, &url, None).await?;
        Ok(unwrap_data(body))
    }

    pub async fn list_favorites(&self, user_email: &str) -> Result<Vec<Favorite>, ApiError> {
        let url = self.endpoint(&["favorites"], &[("userEmail", user_email)]);
        let body = self.fetch(HttpMethod::Get, &url, None).await?;
        decode_list(body, "favorites")
    }

    /// Returns the stored record if the server echoed one back.
    pub async fn create_favorite(&self, favorite: &Favorite) -> Result<Option<Favorite>, ApiError> {
        let url = self.endpoint(&["favorites"], &[]);
        let payload = serde_json::to_value(favorite).map_err(|e| ApiError::Decode {
            what: "favorite",
            reason: e.to_string(),
        })?;
        let body = unwrap_data(self.fetch(HttpMethod::Post, &url, Some(payload)).await?);
        if is_empty_entity(&body) {
            return Ok(None);
        }
        Ok(serde_json::from_value(body)
            .inspect_err(|e| log::warn!("Could not read created favorite: {e}"))
            .ok())
    }

    pub async fn list_admin_artworks(&self) -> Result<Vec<Artwork>, ApiError> {
        let url = self.endpoint(&["admin", "artworks"], &[]);
        let body = self.fetch(HttpMethod::Get, &url, None).await?;
        decode_list(body, "admin artworks")
    }

    pub async fn delete(&self, collection: Collection, id: &str) -> Result<Value, ApiError> {
        let mut segments = collection.segments().to_vec();
        segments.push(id);
        let url = self.endpoint(&segments, &[]);
        self.fetch(HttpMethod::Delete, &url, None).await
    }
}
