//! # Backend client adapter
//!
//! The session logic talks to the identity/document service only through the
//! [`Backend`] trait, so it can run against any implementation:
//!
//! | Implementation | Feature | Purpose |
//! |----------------|---------|---------|
//! | [`MemoryBackend`] | — | Local mock accounts; the test double and offline fallback |
//! | [`FirebaseBackend`] | `firebase` | Firebase Auth + Firestore over their REST APIs |
//! | [`AppBackend`] | — | Enum dispatcher so the app can choose one at startup |
//!
//! ## Contract
//!
//! - `authenticate` / `create_account` open a session and return its
//!   [`SessionHandle`]. Both notify session observers.
//! - `end_session` closes it. Callers treat it as best-effort.
//! - `fetch_profile` returns `Ok(None)` when no profile document exists.
//! - `save_profile` merges a [`ProfilePatch`] into the stored profile, creating
//!   it when the patch is complete enough.
//! - `observe_session` calls the listener right away with the current ambient
//!   session and again on every change, until the returned [`Subscription`] is
//!   dropped.
//! - `restore_session` re-opens the session a previous run left open, when the
//!   backend keeps one in a [`KeyValueStore`]. Observers see it like a fresh
//!   sign-in, which is how a restarted app rehydrates.

use std::future::Future;

use serde::{Deserialize, Serialize};
use store::{KeyValueStore, MemoryStore};

use crate::error::BackendError;
use crate::models::{ProfilePatch, UserProfile};

mod listeners;
mod memory;
mod vault;

#[cfg(feature = "firebase")]
mod firebase;

pub use listeners::{SessionListener, SessionListeners, Subscription};
pub use memory::{BackendOp, MemoryBackend, Suspension, MEMORY_ACCOUNTS_KEY};
pub use vault::AMBIENT_SESSION_KEY;

#[cfg(feature = "firebase")]
pub use firebase::{FirebaseBackend, FirebaseConfig};

/// An open backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHandle {
    /// Backend-issued user id; also the profile document id.
    pub uid: String,
    pub email: String,
    /// Bearer token for document requests, when the backend uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Long-lived token that buys a new `id_token` after a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SessionHandle {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            id_token: None,
            refresh_token: None,
        }
    }
}

/// Async interface to the identity and profile store.
pub trait Backend {
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SessionHandle, BackendError>>;

    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SessionHandle, BackendError>>;

    fn end_session(
        &self,
        handle: &SessionHandle,
    ) -> impl Future<Output = Result<(), BackendError>>;

    fn fetch_profile(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<UserProfile>, BackendError>>;

    fn save_profile(
        &self,
        id: &str,
        patch: &ProfilePatch,
    ) -> impl Future<Output = Result<(), BackendError>>;

    fn observe_session(&self, listener: SessionListener) -> Subscription;

    /// Re-open the session stored by an earlier run, if there is one.
    ///
    /// Call it before registering observers so their first notification
    /// already carries the restored session.
    fn restore_session(&self) -> impl Future<Output = Result<Option<SessionHandle>, BackendError>>;
}

/// Backend chosen at startup from the app configuration.
///
/// `S` is where the backend keeps state between runs.
#[derive(Clone)]
pub enum AppBackend<S = MemoryStore> {
    Memory(MemoryBackend<S>),
    #[cfg(feature = "firebase")]
    Firebase(FirebaseBackend<S>),
}

impl<S> AppBackend<S> {
    pub fn name(&self) -> &'static str {
        match self {
            AppBackend::Memory(_) => "memory",
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(_) => "firebase",
        }
    }
}

impl<S: KeyValueStore> Backend for AppBackend<S> {
    async fn authenticate(&self, email: &str, password: &str) -> Result<SessionHandle, BackendError> {
        match self {
            AppBackend::Memory(b) => b.authenticate(email, password).await,
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.authenticate(email, password).await,
        }
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<SessionHandle, BackendError> {
        match self {
            AppBackend::Memory(b) => b.create_account(email, password).await,
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.create_account(email, password).await,
        }
    }

    async fn end_session(&self, handle: &SessionHandle) -> Result<(), BackendError> {
        match self {
            AppBackend::Memory(b) => b.end_session(handle).await,
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.end_session(handle).await,
        }
    }

    async fn fetch_profile(&self, id: &str) -> Result<Option<UserProfile>, BackendError> {
        match self {
            AppBackend::Memory(b) => b.fetch_profile(id).await,
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.fetch_profile(id).await,
        }
    }

    async fn save_profile(&self, id: &str, patch: &ProfilePatch) -> Result<(), BackendError> {
        match self {
            AppBackend::Memory(b) => b.save_profile(id, patch).await,
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.save_profile(id, patch).await,
        }
    }

    fn observe_session(&self, listener: SessionListener) -> Subscription {
        match self {
            AppBackend::Memory(b) => b.observe_session(listener),
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.observe_session(listener),
        }
    }

    async fn restore_session(&self) -> Result<Option<SessionHandle>, BackendError> {
        match self {
            AppBackend::Memory(b) => b.restore_session().await,
            #[cfg(feature = "firebase")]
            AppBackend::Firebase(b) => b.restore_session().await,
        }
    }
}
