//! Per-page state. Each view owns the list or entity its page renders and routes intents
//! through the shared [`Reconciler`](crate::reconcile::Reconciler). Markup stays in JS.
mod admin;
mod detail;
mod explore;
mod favorites;
mod my_gallery;

pub use admin::AdminView;
pub use detail::ArtworkDetail;
pub use explore::{ArtistSummary, ExploreView, HomeFeed, format_count, initials};
pub use favorites::FavoritesView;
pub use my_gallery::{ArtworkDraft, MyGalleryView, SaveOutcome};
