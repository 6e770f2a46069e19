use std::{cell::RefCell, rc::Rc};

use slotmap::SlotMap;

use crate::models::Favorite;

#[derive(serde::Deserialize, serde::Serialize, tsify::Tsify, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

/// A short title/message pair shown to the user after an intent completes.
#[derive(serde::Deserialize, serde::Serialize, tsify::Tsify, Debug, Clone, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, title, message)
    }
}

slotmap::new_key_type! {
    pub struct ListenerKey;
}

/// Callbacks keyed by [`ListenerKey`].
///
/// Callbacks run after the registry borrow is released, so a listener may subscribe or
/// unsubscribe from inside its own callback.
pub struct Listeners<A: ?Sized> {
    slots: RefCell<SlotMap<ListenerKey, Rc<dyn Fn(&A)>>>,
}

impl<A: ?Sized> Default for Listeners<A> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(SlotMap::with_key()),
        }
    }
}

impl<A: ?Sized> Listeners<A> {
    pub fn register(&self, listener: impl Fn(&A) + 'static) -> ListenerKey {
        self.slots.borrow_mut().insert(Rc::new(listener))
    }

    pub fn unregister(&self, key: ListenerKey) {
        self.slots.borrow_mut().remove(key);
    }

    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    pub fn notify(&self, value: &A) {
        let listeners: Vec<_> = self.slots.borrow().values().cloned().collect();
        for listener in listeners {
            listener(value);
        }
    }
}

/// Application-wide events that other open views may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A favorite was created, either on the server or only in the local queue
    /// (in which case it has no id).
    FavoriteAdded(Favorite),
}

/// Cheap-to-clone handle to the application event bus.
#[derive(Clone, Default)]
pub struct AppEvents {
    listeners: Rc<Listeners<AppEvent>>,
}

impl AppEvents {
    pub fn subscribe(&self, listener: impl Fn(&AppEvent) + 'static) -> ListenerKey {
        self.listeners.register(listener)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.listeners.unregister(key)
    }

    pub fn emit(&self, event: &AppEvent) {
        log::debug!("Dispatching {event:?}");
        self.listeners.notify(event)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
