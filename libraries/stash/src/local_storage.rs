//! `window.localStorage` backend.
use wasm_bindgen::JsValue;

use crate::{Error, KeyValueStore};

fn js_error(e: JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

#[derive(Clone, Debug)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, Error> {
        let window =
            web_sys::window().ok_or_else(|| Error::Unavailable("no global window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| Error::Unavailable(js_error(e)))?
            .ok_or_else(|| Error::Unavailable("localStorage is disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        self.storage
            .get_item(key)
            .map_err(|e| Error::Unavailable(js_error(e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        self.storage.set_item(key, value).map_err(|e| Error::Write {
            key: key.to_string(),
            reason: js_error(e),
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        self.storage.remove_item(key).map_err(|e| Error::Write {
            key: key.to_string(),
            reason: js_error(e),
        })
    }
}
