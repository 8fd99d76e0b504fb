//! # localStorage store — browser-side persistence
//!
//! [`LocalStorageStore`] is the [`KeyValueStore`] implementation used on the
//! **web platform**. Values live in `window.localStorage` under
//! `"<namespace>:<key>"`, so several apps on the same origin do not collide.
//!
//! ## Error handling
//!
//! A browser without `localStorage` (private mode, disabled storage) yields
//! [`StoreError::Unavailable`]. The session layer logs and carries on; the
//! authoritative session always comes from the backend.

use web_sys::Storage;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

const DEFAULT_NAMESPACE: &str = "sightstick";

/// localStorage-backed KeyValueStore for the web platform.
#[derive(Clone, Debug)]
pub struct LocalStorageStore {
    namespace: String,
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStorageStore {
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
        }
    }

    fn storage(&self) -> Result<Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_string()))?
            .local_storage()
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

impl KeyValueStore for LocalStorageStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(&self.scoped(key))
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.storage()?
            .set_item(&self.scoped(key), &value)
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(&self.scoped(key))
            .map_err(|e| StoreError::Unavailable(format!("{e:?}")))
    }
}
