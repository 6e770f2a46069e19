use serde_json::Value;

use crate::notifications::Notice;

/// Failure talking to the REST backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (offline, DNS, CORS rejection).
    #[error("network error: {cause}")]
    Network { cause: String },

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Request {
        status: u16,
        body: Value,
        message: String,
    },

    #[error("invalid API base URL `{base}`: {reason}")]
    InvalidBase { base: String, reason: String },

    #[error("could not decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl ApiError {
    /// Build a `Request` error, taking the human-readable reason from the body's `message`,
    /// then `error`, then the raw text, then the bare status.
    pub fn request(status: u16, body: Value) -> Self {
        let message = ["message", "error", "_raw"]
            .iter()
            .find_map(|field| {
                body.get(field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {status}"));

        ApiError::Request {
            status,
            body,
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The target is already gone. Delete flows treat this as converged, not failed.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) || mentions_not_found(&self.to_string())
    }

    /// The thing being created already exists.
    pub fn is_conflict(&self) -> bool {
        match self {
            ApiError::Request {
                status, message, ..
            } => *status == 409 || message.to_lowercase().contains("already"),
            _ => false,
        }
    }
}

/// Case-insensitive `not\s*found`.
fn mentions_not_found(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.match_indices("not").any(|(at, word)| {
        lower
            .get(at + word.len()..)
            .map(|rest| rest.trim_start().starts_with("found"))
            .unwrap_or(false)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("login required")]
    AuthRequired,

    #[error("not authorized")]
    NotAuthorized,

    #[error("`{0}` was not found")]
    NotFound(String),

    #[error("an operation on `{0}` is already in progress")]
    InFlight(String),

    #[error("{0}")]
    Invalid(String),

    #[error("local storage error: {0}")]
    Storage(#[from] stash::Error),

    #[error("identity provider error: {0}")]
    Identity(String),
}

impl GalleryError {
    /// What the user gets to see. Never includes raw response bodies.
    pub fn notice(&self) -> Notice {
        match self {
            GalleryError::Api(ApiError::Network { .. }) => Notice::error(
                "Network error",
                "Could not reach the server. Please try again.",
            ),
            GalleryError::Api(ApiError::Request { status, body, .. }) => {
                let message = ["message", "error"]
                    .iter()
                    .find_map(|field| {
                        body.get(field)
                            .and_then(Value::as_str)
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                    })
                    .map_or_else(|| format!("Request failed (HTTP {status})"), str::to_string);
                Notice::error("Error", message)
            }
            GalleryError::Api(_) => Notice::error("Error", "Unexpected server response."),
            GalleryError::AuthRequired => Notice::warning("Login Required", "Please login first"),
            GalleryError::NotAuthorized => {
                Notice::error("Not authorized", "This page is for administrators only.")
            }
            GalleryError::NotFound(_) => Notice::error("Not found", "That artwork does not exist."),
            GalleryError::InFlight(_) => {
                Notice::info("Please wait", "That action is already in progress.")
            }
            GalleryError::Invalid(message) => Notice::warning("Validation", message.clone()),
            GalleryError::Storage(_) => {
                Notice::error("Error", "Could not save to this browser's storage.")
            }
            GalleryError::Identity(message) => Notice::error("Error", message.clone()),
        }
    }
}
