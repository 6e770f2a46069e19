//! The signed-in user, as last reported by the identity provider.
//!
//! The provider notifies asynchronously. Until its first notification arrives the session is
//! `loading` and protected views must wait rather than redirect. The context is an explicit
//! handle: create one, pass clones to whoever needs it, and feed it provider notifications
//! through [`SessionContext::set_user`].
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::error::GalleryError;
use crate::models::User;
use crate::notifications::{ListenerKey, Listeners};

pub const LOGIN_ROUTE: &str = "/login";

struct SessionState {
    user: RefCell<Option<User>>,
    loading: Cell<bool>,
    listeners: Listeners<Option<User>>,
}

#[derive(Clone)]
pub struct SessionContext {
    state: Rc<SessionState>,
}

/// What a protected view should do right now.
#[derive(serde::Serialize, tsify::Tsify, Debug, Clone, PartialEq, Eq)]
#[tsify(into_wasm_abi)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Access {
    /// The provider has not reported yet.
    Pending,
    Redirect { to: String, from: String },
    Granted { user: User },
}

impl SessionContext {
    /// A session waiting for the identity provider's first notification.
    pub fn new() -> Self {
        Self {
            state: Rc::new(SessionState {
                user: RefCell::new(None),
                loading: Cell::new(true),
                listeners: Listeners::default(),
            }),
        }
    }

    /// A session whose state is already known.
    pub fn with_user(user: Option<User>) -> Self {
        let session = Self::new();
        session.set_user(user);
        session
    }

    pub fn user(&self) -> Option<User> {
        self.state.user.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading.get()
    }

    pub fn require_user(&self) -> Result<User, GalleryError> {
        self.user().ok_or(GalleryError::AuthRequired)
    }

    pub fn guard(&self, from: &str) -> Access {
        if self.is_loading() {
            return Access::Pending;
        }
        match self.user() {
            Some(user) => Access::Granted { user },
            None => Access::Redirect {
                to: LOGIN_ROUTE.to_string(),
                from: from.to_string(),
            },
        }
    }

    /// Called for every identity-provider notification, including sign-out (`None`).
    pub fn set_user(&self, user: Option<User>) {
        log::info!(
            "Session changed: {}",
            user.as_ref().map(|u| u.email.as_str()).unwrap_or("signed out")
        );
        *self.state.user.borrow_mut() = user.clone();
        self.state.loading.set(false);
        self.state.listeners.notify(&user);
    }

    pub fn subscribe(&self, listener: impl Fn(&Option<User>) + 'static) -> ListenerKey {
        self.state.listeners.register(listener)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.state.listeners.unregister(key)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
