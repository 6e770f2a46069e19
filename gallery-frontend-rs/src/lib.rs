#![deny(clippy::string_slice)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fallback;
pub mod list;
pub mod models;
pub mod notifications;
pub mod reconcile;
pub mod session;
pub mod transport;
mod utils;
pub mod validators;
pub mod views;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;

use chrono::Utc;
use slotmap::{Key, KeyData};
use stash::LocalStorage;
use wasm_bindgen::prelude::*;

use crate::api::ApiClient;
use crate::auth::{JsIdentityProvider, Registration};
use crate::config::GalleryConfig;
use crate::error::GalleryError;
use crate::fallback::LocalFallback;
use crate::models::{Artwork, FavoriteEntry, User};
use crate::notifications::{AppEvents, ListenerKey, Notice};
use crate::reconcile::Reconciler;
use crate::session::{Access, SessionContext};
use crate::transport::FetchTransport;
use crate::validators::PasswordCheck;
use crate::views::{
    AdminView, ArtworkDetail, ArtworkDraft, ExploreView, FavoritesView, HomeFeed, MyGalleryView,
};

type BrowserReconciler = Reconciler<FetchTransport, LocalStorage>;

#[wasm_bindgen]
pub struct Gallery {
    // we should never hold a borrow across an .await. by avoiding this, we guarantee the absence of "borrow while locked" panics
    reconciler: Rc<BrowserReconciler>,
    identity: RefCell<Option<Rc<JsIdentityProvider>>>,

    detail: ArtworkDetail<FetchTransport, LocalStorage>,
    favorites: FavoritesView<FetchTransport, LocalStorage>,
    my_gallery: MyGalleryView<FetchTransport, LocalStorage>,
    explore: ExploreView<FetchTransport, LocalStorage>,
    admin: AdminView<FetchTransport, LocalStorage>,
}

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
#[allow(clippy::declare_interior_mutable_const)]
const LOGGER: LazyLock<()> = LazyLock::new(|| {
    utils::set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

/// Log the failure and turn it into what the user should see.
fn report<T>(result: Result<T, GalleryError>, notice: impl FnOnce(&T) -> Notice) -> Notice {
    match result {
        Ok(value) => notice(&value),
        Err(GalleryError::InFlight(key)) => {
            log::debug!("Ignoring repeated request for {key}");
            GalleryError::InFlight(key).notice()
        }
        Err(e) => {
            log::error!("{e}");
            e.notice()
        }
    }
}

/// Failed loads reject the JS promise with a `Notice`.
fn reject(e: GalleryError) -> JsValue {
    log::error!("{e}");
    serde_wasm_bindgen::to_value(&e.notice()).unwrap_or_else(|_| JsValue::from_str(&e.to_string()))
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Gallery {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(config: GalleryConfig) -> Result<Gallery, JsValue> {
        // used to only initialize the logger once
        #[allow(clippy::borrow_interior_mutable_const)]
        *LOGGER;

        let storage = LocalStorage::open()
            .inspect_err(|e| log::error!("Error opening local storage: {e}"))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let api = ApiClient::new(FetchTransport, &config.api_base)
            .inspect_err(|e| log::error!("Error configuring API client: {e}"))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Using API at {}", api.base());

        let reconciler = Rc::new(Reconciler::new(
            api,
            LocalFallback::new(storage),
            SessionContext::new(),
            AppEvents::default(),
        ));

        Ok(Self {
            detail: ArtworkDetail::new(Rc::clone(&reconciler)),
            favorites: FavoritesView::new(Rc::clone(&reconciler)),
            my_gallery: MyGalleryView::new(Rc::clone(&reconciler)),
            explore: ExploreView::new(Rc::clone(&reconciler)),
            admin: AdminView::new(Rc::clone(&reconciler), config),
            identity: RefCell::new(None),
            reconciler,
        })
    }

    // session

    /// Forward every identity-provider auth-state notification here.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_user(&self, user: Option<User>) {
        self.reconciler.session().set_user(user);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn current_user(&self) -> Option<User> {
        self.reconciler.session().user()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_session_loading(&self) -> bool {
        self.reconciler.session().is_loading()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn guard(&self, from: String) -> Access {
        self.reconciler.session().guard(&from)
    }

    /// `callback` receives the new user (or `null`) on every change. Returns a key for
    /// [`Gallery::unsubscribe_session`].
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn subscribe_session(&self, callback: js_sys::Function) -> u64 {
        let key = self.reconciler.session().subscribe(move |user| {
            let this = JsValue::null();
            let user = serde_wasm_bindgen::to_value(user).unwrap_or(JsValue::NULL);
            let _ = callback.call1(&this, &user);
        });
        key.data().as_ffi()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn unsubscribe_session(&self, key: u64) {
        self.reconciler
            .session()
            .unsubscribe(ListenerKey::from(KeyData::from_ffi(key)))
    }

    // identity

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn set_identity_provider(&self, provider: JsIdentityProvider) {
        *self.identity.borrow_mut() = Some(Rc::new(provider));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn register(&self, registration: Registration) -> Notice {
        let result = match self.identity() {
            Ok(provider) => {
                auth::register(&*provider, self.reconciler.session(), &registration).await
            }
            Err(e) => Err(e),
        };
        report(result, |_| {
            Notice::success("Registered", "Your account has been created.")
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn login(&self, email: String, password: String) -> Notice {
        let result = match self.identity() {
            Ok(provider) => {
                auth::login(&*provider, self.reconciler.session(), &email, &password).await
            }
            Err(e) => Err(e),
        };
        report(result, |user| {
            Notice::success("Welcome", format!("Logged in as {}", user.name_or_email()))
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn login_with_popup(&self) -> Notice {
        let result = match self.identity() {
            Ok(provider) => auth::login_with_popup(&*provider, self.reconciler.session()).await,
            Err(e) => Err(e),
        };
        report(result, |user| {
            Notice::success("Welcome", format!("Logged in as {}", user.name_or_email()))
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn logout(&self) -> Notice {
        let result = match self.identity() {
            Ok(provider) => auth::logout(&*provider, self.reconciler.session()).await,
            Err(e) => Err(e),
        };
        report(result, |_| Notice::info("Logged out", "See you soon."))
    }

    // artwork detail

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn load_artwork(&self, id: String) -> Result<Artwork, JsValue> {
        self.detail.load(&id).await.map_err(reject)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn artwork(&self) -> Option<Artwork> {
        self.detail.artwork()
    }

    /// `on_render` is called with each like count to show, starting with the optimistic one.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn like_artwork(&self, on_render: Option<js_sys::Function>) -> Notice {
        let render = |likes: u64| {
            if let Some(callback) = &on_render {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_f64(likes as f64));
            }
        };
        report(self.detail.like_with(render).await, |outcome| {
            outcome.notice()
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn favorite_artwork(&self) -> Notice {
        report(self.detail.favorite().await, |outcome| outcome.notice())
    }

    /// Favorite an artwork from a listing (home, explore) rather than the detail page.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn favorite(&self, artwork: Artwork) -> Notice {
        report(self.reconciler.favorite(&artwork).await, |outcome| {
            outcome.notice()
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_liking(&self) -> bool {
        self.detail.is_liking()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_favoriting(&self, artwork_id: String) -> bool {
        self.reconciler.is_favoriting(&artwork_id)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn local_like_delta(&self, artwork_id: String) -> u32 {
        self.reconciler.fallback().read_like_delta(&artwork_id)
    }

    // favorites

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn load_favorites(&self) -> Result<Vec<FavoriteEntry>, JsValue> {
        self.favorites.load().await.map_err(reject)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.favorites.entries()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn remove_favorite(&self, record_id: Option<String>, item_id: String) -> Notice {
        report(
            self.favorites.remove(record_id.as_deref(), &item_id).await,
            |outcome| outcome.notice(),
        )
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_removing_favorite(&self, record_id: String) -> bool {
        self.favorites.is_removing(&record_id)
    }

    /// Keep the favorites list up to date with favorites added elsewhere in the app.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn attach_favorites(&self) {
        self.favorites.attach()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn detach_favorites(&self) {
        self.favorites.detach()
    }

    // my gallery

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn load_my_gallery(&self) -> Result<Vec<Artwork>, JsValue> {
        self.my_gallery.load().await.map_err(reject)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn my_artworks(&self) -> Vec<Artwork> {
        self.my_gallery.artworks()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn delete_my_artwork(&self, id: String) -> Notice {
        report(self.my_gallery.delete(&id).await, |outcome| outcome.notice())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_deleting_my_artwork(&self, id: String) -> bool {
        self.my_gallery.is_deleting(&id)
    }

    /// A blank form, with the artist prefilled for the signed-in user.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn new_draft(&self) -> ArtworkDraft {
        self.reconciler
            .session()
            .user()
            .map(|user| ArtworkDraft::for_user(&user))
            .unwrap_or_default()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn draft_from(&self, artwork: Artwork) -> ArtworkDraft {
        ArtworkDraft::from_artwork(&artwork)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn save_artwork(&self, draft: ArtworkDraft, editing: Option<String>) -> Notice {
        report(
            self.my_gallery.save(&draft, editing.as_deref()).await,
            |outcome| outcome.notice(),
        )
    }

    // explore / home

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn load_explore(&self) -> Result<Vec<Artwork>, JsValue> {
        self.explore.load().await.map_err(reject)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn explore_artworks(&self) -> Vec<Artwork> {
        self.explore.artworks()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn home_feed(&self) -> HomeFeed {
        self.explore.home_feed(Utc::now())
    }

    // admin

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_admin(&self) -> bool {
        self.admin.authorize().is_ok()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn load_admin(&self) -> Result<Vec<Artwork>, JsValue> {
        self.admin.load().await.map_err(reject)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn admin_artworks(&self) -> Vec<Artwork> {
        self.admin.artworks()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn delete_admin_artwork(&self, id: String) -> Notice {
        report(self.admin.delete(&id).await, |outcome| outcome.notice())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_deleting_admin_artwork(&self, id: String) -> bool {
        self.admin.is_deleting(&id)
    }
}

impl Gallery {
    fn identity(&self) -> Result<Rc<JsIdentityProvider>, GalleryError> {
        self.identity
            .borrow()
            .clone()
            .ok_or_else(|| GalleryError::Identity("no identity provider configured".to_string()))
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn check_password(password: String) -> PasswordCheck {
    validators::validate_password(&password)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn format_count(n: f64) -> String {
    views::format_count(n.max(0.0) as u64)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn initials(name: String) -> String {
    views::initials(&name)
}
