//! Typed records on top of a string key/value store.
//!
//! The browser's `localStorage` is the store this was written for: synchronous, string-only,
//! shared between tabs of the same origin, and able to throw on write (quota, private mode).
//! [`Record`] layers a JSON-encoded value of a fixed type over one key. Reads never fail: a
//! missing or unreadable value comes back as `T::default()` and the problem is logged, because
//! everything kept here is a best-effort cache of state the server will eventually own.
//!
//! There is no cross-tab locking. Two tabs doing read-modify-write on the same key race and the
//! last write wins.

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

#[cfg(feature = "local-storage")]
mod local_storage;
mod memory;

#[cfg(feature = "local-storage")]
pub use local_storage::LocalStorage;
pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("could not write `{key}`: {reason}")]
    Write { key: String, reason: String },

    #[error("could not encode `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A synchronous string key/value store.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;

    fn remove_item(&self, key: &str) -> Result<(), Error>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        (**self).remove_item(key)
    }
}

/// A JSON value of type `T` stored under a fixed key.
pub struct Record<T> {
    key: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> Record<T> {
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}

impl<T> Record<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn load(&self, store: &impl KeyValueStore) -> T {
        let raw = match store.get_item(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                log::warn!("Could not read `{}`: {e}", self.key);
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable value under `{}`: {e}", self.key);
            T::default()
        })
    }

    pub fn save(&self, store: &impl KeyValueStore, value: &T) -> Result<(), Error> {
        let raw = serde_json::to_string(value).map_err(|source| Error::Encode {
            key: self.key.to_string(),
            source,
        })?;
        store.set_item(self.key, &raw)
    }

    /// Read-modify-write. Nothing is written if `f` panics.
    pub fn update<R>(
        &self,
        store: &impl KeyValueStore,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, Error> {
        let mut value = self.load(store);
        let result = f(&mut value);
        self.save(store, &value)?;
        Ok(result)
    }

    pub fn clear(&self, store: &impl KeyValueStore) -> Result<(), Error> {
        store.remove_item(self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const COUNTS: Record<BTreeMap<String, u32>> = Record::new("counts");

    #[test]
    fn test_missing_record_loads_default() {
        let store = MemoryStore::default();
        assert!(COUNTS.load(&store).is_empty());
    }

    #[test]
    fn test_update_persists() {
        let store = MemoryStore::default();
        let n = COUNTS
            .update(&store, |counts| {
                let n = counts.entry("a".to_string()).or_insert(0);
                *n += 1;
                *n
            })
            .unwrap();

        assert_eq!(n, 1);
        assert_eq!(store.raw("counts").as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_corrupt_record_loads_default() {
        let store = MemoryStore::default();
        store.set_item("counts", "{not json").unwrap();

        assert!(COUNTS.load(&store).is_empty());
    }

    #[test]
    fn test_failed_write_is_reported() {
        let store = MemoryStore::default();
        store.fail_writes(true);

        let result = COUNTS.update(&store, |counts| counts.insert("a".to_string(), 1));
        assert!(matches!(result, Err(Error::Write { .. })));
        assert_eq!(store.raw("counts"), None);
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::default();
        COUNTS.save(&store, &BTreeMap::from([("a".to_string(), 2)])).unwrap();
        COUNTS.clear(&store).unwrap();

        assert_eq!(store.raw("counts"), None);
    }
}
