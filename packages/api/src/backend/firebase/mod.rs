//! # Firebase backend
//!
//! [`FirebaseBackend`] implements the [`Backend`] contract against Firebase's
//! REST APIs:
//!
//! - **Identity Toolkit** — `accounts:signInWithPassword` and `accounts:signUp`
//!   exchange an email/password pair for a `localId` (the user id) and an
//!   `idToken`. Error codes from the response body are mapped onto
//!   [`BackendError`] by [`map_auth_error`].
//! - **Firestore** — one document per user under
//!   `<profiles_collection>/<uid>`. Reads return `Ok(None)` on 404; writes are
//!   `PATCH` requests with an `updateMask`, so they merge instead of replacing
//!   the document.
//!
//! - **Secure Token** — exchanges the refresh token of a session stored by an
//!   earlier run for a fresh `idToken` in [`Backend::restore_session`].
//!
//! Signing out is local, as in the Firebase client SDKs: the token is dropped
//! and observers are told the session ended. A backend built with
//! [`FirebaseBackend::persistent`] keeps the open session (including its
//! refresh token) in a [`KeyValueStore`] so a restarted app signs back in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::StatusCode;
use serde::Deserialize;
use store::{KeyValueStore, MemoryStore};

use super::vault::SessionVault;
use super::{Backend, SessionHandle, SessionListener, SessionListeners, Subscription};
use crate::auth::MIN_PASSWORD_LEN;
use crate::error::BackendError;
use crate::models::{ProfilePatch, UserProfile};

mod config;
mod firestore;

pub use config::FirebaseConfig;

/// Successful Identity Toolkit response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: Option<String>,
}

/// Secure Token response; unlike Identity Toolkit it uses snake_case.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    user_id: String,
    id_token: String,
    refresh_token: String,
}

/// Identity Toolkit error envelope: `{"error": {"message": "EMAIL_EXISTS"}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

struct FirebaseInner<S> {
    config: FirebaseConfig,
    http: reqwest::Client,
    current: Mutex<Option<SessionHandle>>,
    listeners: SessionListeners,
    vault: SessionVault<S>,
}

/// Firebase Auth + Firestore backend.
pub struct FirebaseBackend<S = MemoryStore> {
    inner: Arc<FirebaseInner<S>>,
}

impl<S> Clone for FirebaseBackend<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::unknown(e.to_string())
}

/// Map an Identity Toolkit error code onto the adapter taxonomy.
pub(crate) fn map_auth_error(code: &str) -> BackendError {
    // Codes may carry a detail suffix, e.g. "WEAK_PASSWORD : Password should be ...".
    let code = code.split(':').next().unwrap_or(code).trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED"
        | "INVALID_EMAIL" => BackendError::InvalidCredentials,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => BackendError::RateLimited,
        "EMAIL_EXISTS" => BackendError::EmailInUse,
        "WEAK_PASSWORD" => BackendError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        },
        other => BackendError::unknown(other),
    }
}

impl FirebaseBackend {
    /// A backend whose session ends with the process.
    pub fn new(config: FirebaseConfig) -> Self {
        Self::with_store(config, None)
    }

    pub fn from_env() -> Result<Self, String> {
        Ok(Self::new(FirebaseConfig::from_env()?))
    }
}

impl<S: KeyValueStore> FirebaseBackend<S> {
    /// A backend that keeps its open session in `store`.
    pub fn persistent(config: FirebaseConfig, store: S) -> Self {
        Self::with_store(config, Some(store))
    }

    pub fn with_store(config: FirebaseConfig, store: Option<S>) -> Self {
        Self {
            inner: Arc::new(FirebaseInner {
                config,
                http: reqwest::Client::new(),
                current: Mutex::new(None),
                listeners: SessionListeners::new(),
                vault: SessionVault::new(store),
            }),
        }
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.inner.config
    }

    fn current(&self) -> MutexGuard<'_, Option<SessionHandle>> {
        self.inner.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Token of the open session, if it belongs to `uid`.
    fn token_for(&self, uid: &str) -> Option<String> {
        self.current()
            .as_ref()
            .filter(|h| h.uid == uid)
            .and_then(|h| h.id_token.clone())
    }

    async fn account_request(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<SessionHandle, BackendError> {
        let response = self
            .inner
            .http
            .post(self.inner.config.accounts_url(method))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let status = response.status();
            return match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => Err(map_auth_error(&envelope.error.message)),
                Err(_) => Err(BackendError::unknown(format!(
                    "Identity service returned {status}"
                ))),
            };
        }

        let account: AccountResponse = response.json().await.map_err(transport)?;
        let handle = SessionHandle {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| email.trim().to_string()),
            id_token: Some(account.id_token),
            refresh_token: account.refresh_token,
        };
        self.open_session(handle.clone()).await;
        Ok(handle)
    }

    async fn open_session(&self, handle: SessionHandle) {
        *self.current() = Some(handle.clone());
        self.inner.vault.remember(Some(&handle)).await;
        self.inner.listeners.notify(Some(handle));
    }

    /// Trade the refresh token of `saved` for a new id token.
    ///
    /// `Ok(None)` means the token service rejected it and the session is over.
    async fn refresh(&self, saved: &SessionHandle, refresh_token: &str) -> Result<Option<SessionHandle>, BackendError> {
        let response = self
            .inner
            .http
            .post(self.inner.config.token_url())
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_client_error() {
            let reason = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.to_string(),
            };
            tracing::info!("Stored session for {} was rejected: {}", saved.uid, reason);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BackendError::unknown(format!("Token service returned {status}")));
        }

        let token: TokenResponse = response.json().await.map_err(transport)?;
        Ok(Some(SessionHandle {
            uid: token.user_id,
            email: saved.email.clone(),
            id_token: Some(token.id_token),
            refresh_token: Some(token.refresh_token),
        }))
    }
}

impl<S: KeyValueStore> Backend for FirebaseBackend<S> {
    async fn authenticate(&self, email: &str, password: &str) -> Result<SessionHandle, BackendError> {
        self.account_request("signInWithPassword", email, password).await
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<SessionHandle, BackendError> {
        self.account_request("signUp", email, password).await
    }

    async fn end_session(&self, handle: &SessionHandle) -> Result<(), BackendError> {
        let ended = {
            let mut current = self.current();
            match current.as_ref() {
                Some(open) if open.uid == handle.uid => {
                    *current = None;
                    true
                }
                _ => false,
            }
        };
        if ended {
            self.inner.vault.remember(None).await;
            self.inner.listeners.notify(None);
        }
        Ok(())
    }

    async fn fetch_profile(&self, id: &str) -> Result<Option<UserProfile>, BackendError> {
        let mut request = self.inner.http.get(self.inner.config.profile_url(id));
        if let Some(token) = self.token_for(id) {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document: serde_json::Value = response.json().await.map_err(transport)?;
                firestore::decode_profile(id, &document).map(Some)
            }
            status => Err(BackendError::unknown(format!(
                "Firestore returned {status} reading profile {id}"
            ))),
        }
    }

    async fn save_profile(&self, id: &str, patch: &ProfilePatch) -> Result<(), BackendError> {
        if patch.is_empty() {
            return Ok(());
        }
        let (mask, body) = firestore::encode_patch(patch)?;
        let query: Vec<(&str, &str)> = mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect();

        let mut request = self
            .inner
            .http
            .patch(self.inner.config.profile_url(id))
            .query(&query)
            .json(&body);
        if let Some(token) = self.token_for(id) {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport)?;

        if !response.status().is_success() {
            return Err(BackendError::unknown(format!(
                "Firestore returned {} writing profile {id}",
                response.status()
            )));
        }
        Ok(())
    }

    fn observe_session(&self, listener: SessionListener) -> Subscription {
        let current = self.current().clone();
        self.inner.listeners.subscribe(listener, current)
    }

    async fn restore_session(&self) -> Result<Option<SessionHandle>, BackendError> {
        let Some(saved) = self.inner.vault.load().await else {
            return Ok(None);
        };

        let handle = match saved.refresh_token.as_deref() {
            Some(refresh_token) => match self.refresh(&saved, refresh_token).await {
                Ok(Some(fresh)) => fresh,
                Ok(None) => {
                    self.inner.vault.remember(None).await;
                    return Ok(None);
                }
                Err(e) => {
                    // Offline: keep the stored tokens, the profile cache covers reads.
                    tracing::warn!("Could not refresh stored session for {}: {}", saved.uid, e);
                    saved
                }
            },
            None => saved,
        };

        tracing::info!("Restored Firebase session for {}", handle.uid);
        self.open_session(handle.clone()).await;
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_auth_error() {
        assert_eq!(map_auth_error("EMAIL_EXISTS"), BackendError::EmailInUse);
        assert_eq!(
            map_auth_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            BackendError::WeakPassword { min: 6 }
        );
        assert_eq!(
            map_auth_error("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            BackendError::RateLimited
        );
        assert_eq!(
            map_auth_error("INVALID_LOGIN_CREDENTIALS"),
            BackendError::InvalidCredentials
        );
        assert_eq!(
            map_auth_error("OPERATION_NOT_ALLOWED"),
            BackendError::unknown("OPERATION_NOT_ALLOWED")
        );
    }

    #[tokio::test]
    async fn test_end_session_is_local() {
        let backend = FirebaseBackend::new(FirebaseConfig::new("KEY", "project"));
        let handle = SessionHandle {
            id_token: Some("token".to_string()),
            ..SessionHandle::new("u1", "a@b.com")
        };
        *backend.current() = Some(handle.clone());
        assert_eq!(backend.token_for("u1").as_deref(), Some("token"));
        assert!(backend.token_for("u2").is_none());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = backend.observe_session(Box::new(move |h| {
            sink.lock().unwrap().push(h.map(|h| h.uid));
        }));
        backend.end_session(&handle).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string()), None]);
        assert!(backend.token_for("u1").is_none());
    }

    #[tokio::test]
    async fn test_stored_session_is_restored_and_forgotten() {
        let store = MemoryStore::new();
        let stored = SessionHandle {
            id_token: Some("token".to_string()),
            ..SessionHandle::new("u1", "a@b.com")
        };
        SessionVault::new(Some(store.clone())).remember(Some(&stored)).await;

        let backend = FirebaseBackend::persistent(FirebaseConfig::new("KEY", "project"), store.clone());
        assert_eq!(backend.restore_session().await.unwrap(), Some(stored.clone()));
        assert_eq!(backend.token_for("u1").as_deref(), Some("token"));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = backend.observe_session(Box::new(move |h| {
            sink.lock().unwrap().push(h.map(|h| h.uid));
        }));
        assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_string())]);

        backend.end_session(&stored).await.unwrap();
        assert!(store.is_empty());
        let restarted = FirebaseBackend::persistent(FirebaseConfig::new("KEY", "project"), store);
        assert_eq!(restarted.restore_session().await.unwrap(), None);
    }
}
