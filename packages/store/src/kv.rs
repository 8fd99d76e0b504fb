//! # Key/value persistence and the session cache
//!
//! The session layer keeps the profile of the signed-in user locally, so a
//! restarted app whose backend session is back but whose profile fetch fails
//! can still show it. The backends keep their own open session in the same
//! store under a separate key. Storage goes through the [`KeyValueStore`]
//! trait so the same logic works against memory (tests), the filesystem
//! (desktop) and the browser's `localStorage` (web).
//!
//! [`SessionCache`] adds typed JSON access under a single key, by default
//! [`SESSION_USER_KEY`]. The cache is never authoritative; callers write it
//! only after the backend confirmed a sign-in and clear it on sign-out.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Key under which the signed-in user's profile is cached.
pub const SESSION_USER_KEY: &str = "session_user";

/// Async interface for string key/value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>>;
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), StoreError>>;
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>>;
}

/// Typed JSON cache for one value stored under one key.
#[derive(Clone, Debug)]
pub struct SessionCache<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SessionCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, SESSION_USER_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the cached value. A value that no longer parses is an error.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        match self.store.get(&self.key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(&self.key, raw).await
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key).await
    }
}
