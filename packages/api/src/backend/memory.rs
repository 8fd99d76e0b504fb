//! # In-memory backend
//!
//! [`MemoryBackend`] keeps accounts, profiles and the ambient session in
//! process memory. It is the local/mock identity service of the app and the
//! fake adapter used by tests, so besides the [`Backend`] contract it offers a
//! few test hooks:
//!
//! - [`seed_account`](MemoryBackend::seed_account) / [`seed_profile`](MemoryBackend::seed_profile)
//!   to prepare data without going through registration.
//! - [`fail_next`](MemoryBackend::fail_next) to make the next call of one
//!   operation fail with a chosen error.
//! - [`suspend`](MemoryBackend::suspend) to park every operation until the
//!   returned [`Suspension`] is dropped, which lets a test observe the caller
//!   while a request is in flight.
//! - [`calls`](MemoryBackend::calls) to count how often an operation ran.
//!
//! Credentials are stored as Argon2id hashes keyed by the normalized email.
//!
//! ## Persistence
//!
//! [`MemoryBackend::persistent`] writes accounts and profiles under
//! [`MEMORY_ACCOUNTS_KEY`] and the open session under
//! [`AMBIENT_SESSION_KEY`](super::AMBIENT_SESSION_KEY) after every successful
//! write, so the app's local accounts survive a restart. Seeded data is
//! written with the next successful write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use store::{KeyValueStore, MemoryStore, SessionCache};
use tokio::sync::OwnedMutexGuard;

use super::vault::SessionVault;
use super::{Backend, SessionHandle, SessionListener, SessionListeners, Subscription};
use crate::auth::{check_strength, hash_password, normalize_email, verify_password};
use crate::error::BackendError;
use crate::models::{ProfilePatch, UserProfile};

/// Key under which a persistent [`MemoryBackend`] stores accounts and profiles.
pub const MEMORY_ACCOUNTS_KEY: &str = "memory_accounts";

/// Backend operations, used to target injected failures and call counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Authenticate,
    CreateAccount,
    EndSession,
    FetchProfile,
    SaveProfile,
    RestoreSession,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
}

/// Durable part of the backend.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Accounts {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    profiles: Vec<UserProfile>,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    profiles: HashMap<String, UserProfile>,
    current: Option<SessionHandle>,
    failures: HashMap<BackendOp, BackendError>,
    calls: HashMap<BackendOp, usize>,
}

impl MemoryState {
    fn durable(&self) -> Accounts {
        Accounts {
            accounts: self.accounts.values().cloned().collect(),
            profiles: self.profiles.values().cloned().collect(),
        }
    }

    fn has_uid(&self, uid: &str) -> bool {
        self.accounts.values().any(|a| a.uid == uid)
    }
}

struct MemoryInner<S> {
    state: Mutex<MemoryState>,
    listeners: SessionListeners,
    gate: Arc<tokio::sync::Mutex<()>>,
    accounts: Option<SessionCache<S>>,
    vault: SessionVault<S>,
}

/// In-memory identity service and profile store, optionally kept in `S`.
pub struct MemoryBackend<S = MemoryStore> {
    inner: Arc<MemoryInner<S>>,
}

impl<S> Clone for MemoryBackend<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps every [`MemoryBackend`] operation parked until dropped.
pub struct Suspension {
    _guard: OwnedMutexGuard<()>,
}

impl Suspension {
    pub fn resume(self) {}
}

impl MemoryBackend {
    /// A backend that forgets everything when dropped.
    pub fn new() -> Self {
        Self::with_store(None)
    }
}

impl<S: KeyValueStore + Clone> MemoryBackend<S> {
    /// A backend whose accounts and open session are kept in `store`.
    pub fn persistent(store: S) -> Self {
        Self::with_store(Some(store))
    }

    pub fn with_store(store: Option<S>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                state: Mutex::new(MemoryState::default()),
                listeners: SessionListeners::new(),
                gate: Arc::default(),
                accounts: store
                    .clone()
                    .map(|store| SessionCache::with_key(store, MEMORY_ACCOUNTS_KEY)),
                vault: SessionVault::new(store),
            }),
        }
    }
}

impl<S: KeyValueStore> MemoryBackend<S> {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create an account directly. Returns the new user id.
    pub fn seed_account(&self, email: &str, password: &str) -> Result<String, BackendError> {
        let key = normalize_email(email);
        let password_hash = hash_password(password)?;
        let mut state = self.state();
        if state.accounts.contains_key(&key) {
            return Err(BackendError::EmailInUse);
        }
        let uid = uuid::Uuid::new_v4().to_string();
        state.accounts.insert(
            key.clone(),
            Account {
                uid: uid.clone(),
                email: key,
                password_hash,
            },
        );
        Ok(uid)
    }

    /// Store a profile under its own id, replacing any existing one.
    pub fn seed_profile(&self, profile: UserProfile) {
        self.state().profiles.insert(profile.id.clone(), profile);
    }

    /// Read a stored profile without going through the async contract.
    pub fn profile(&self, id: &str) -> Option<UserProfile> {
        self.state().profiles.get(id).cloned()
    }

    /// The ambient session, if one is open.
    pub fn current_session(&self) -> Option<SessionHandle> {
        self.state().current.clone()
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: BackendOp, error: BackendError) {
        self.state().failures.insert(op, error);
    }

    /// How many times `op` has been called.
    pub fn calls(&self, op: BackendOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }

    /// Park all operations until the returned guard is dropped.
    ///
    /// Returns `None` if the backend is already suspended.
    pub fn suspend(&self) -> Option<Suspension> {
        self.inner
            .gate
            .clone()
            .try_lock_owned()
            .ok()
            .map(|guard| Suspension { _guard: guard })
    }

    pub fn observer_count(&self) -> usize {
        self.inner.listeners.len()
    }

    async fn enter(&self, op: BackendOp) -> Result<(), BackendError> {
        drop(self.inner.gate.lock().await);
        let mut state = self.state();
        *state.calls.entry(op).or_insert(0) += 1;
        match state.failures.remove(&op) {
            Some(error) => {
                tracing::debug!("memory backend: injected failure for {:?}: {}", op, error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Write accounts and profiles to the store, if there is one.
    async fn save_accounts(&self) {
        let Some(slot) = &self.inner.accounts else {
            return;
        };
        let durable = self.state().durable();
        if let Err(e) = slot.save(&durable).await {
            tracing::warn!("memory backend: failed to store accounts: {}", e);
        }
    }

    async fn open_session(&self, handle: SessionHandle) {
        self.state().current = Some(handle.clone());
        self.inner.vault.remember(Some(&handle)).await;
        self.inner.listeners.notify(Some(handle));
    }
}

impl<S: KeyValueStore> Backend for MemoryBackend<S> {
    async fn authenticate(&self, email: &str, password: &str) -> Result<SessionHandle, BackendError> {
        self.enter(BackendOp::Authenticate).await?;

        let key = normalize_email(email);
        let (uid, email, password_hash) = {
            let state = self.state();
            let account = state
                .accounts
                .get(&key)
                .ok_or(BackendError::InvalidCredentials)?;
            (
                account.uid.clone(),
                account.email.clone(),
                account.password_hash.clone(),
            )
        };
        if !verify_password(password, &password_hash)? {
            return Err(BackendError::InvalidCredentials);
        }

        let handle = SessionHandle::new(uid, email);
        self.open_session(handle.clone()).await;
        Ok(handle)
    }

    async fn create_account(&self, email: &str, password: &str) -> Result<SessionHandle, BackendError> {
        self.enter(BackendOp::CreateAccount).await?;

        let key = normalize_email(email);
        if key.is_empty() || !key.contains('@') {
            return Err(BackendError::unknown("Invalid email address"));
        }
        check_strength(password)?;
        if self.state().accounts.contains_key(&key) {
            return Err(BackendError::EmailInUse);
        }

        let uid = self.seed_account(&key, password)?;
        self.save_accounts().await;
        let handle = SessionHandle::new(uid, key);
        self.open_session(handle.clone()).await;
        Ok(handle)
    }

    async fn end_session(&self, handle: &SessionHandle) -> Result<(), BackendError> {
        self.enter(BackendOp::EndSession).await?;

        let ended = {
            let mut state = self.state();
            match &state.current {
                Some(current) if current.uid == handle.uid => {
                    state.current = None;
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
        self.enter(BackendOp::FetchProfile).await?;
        Ok(self.profile(id))
    }

    async fn save_profile(&self, id: &str, patch: &ProfilePatch) -> Result<(), BackendError> {
        self.enter(BackendOp::SaveProfile).await?;

        {
            let mut state = self.state();
            let next = match state.profiles.get(id) {
                Some(existing) => existing.merged(patch),
                None => UserProfile::from_patch(id, patch)
                    .ok_or_else(|| BackendError::unknown(format!("Profile {id} is incomplete")))?,
            };
            state.profiles.insert(id.to_string(), next);
        }
        self.save_accounts().await;
        Ok(())
    }

    fn observe_session(&self, listener: SessionListener) -> Subscription {
        let current = self.current_session();
        self.inner.listeners.subscribe(listener, current)
    }

    async fn restore_session(&self) -> Result<Option<SessionHandle>, BackendError> {
        self.enter(BackendOp::RestoreSession).await?;

        if let Some(slot) = &self.inner.accounts {
            if let Some(durable) = slot.load::<Accounts>().await? {
                let mut state = self.state();
                for account in durable.accounts {
                    state.accounts.entry(account.email.clone()).or_insert(account);
                }
                for profile in durable.profiles {
                    state.profiles.entry(profile.id.clone()).or_insert(profile);
                }
            }
        }

        let Some(handle) = self.inner.vault.load().await else {
            return Ok(None);
        };
        if !self.state().has_uid(&handle.uid) {
            tracing::info!("memory backend: stored session for unknown user {}", handle.uid);
            self.inner.vault.remember(None).await;
            return Ok(None);
        }
        tracing::debug!("memory backend: restored session for {}", handle.uid);
        self.open_session(handle.clone()).await;
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, ProfileDraft};

    #[tokio::test]
    async fn test_create_account_then_authenticate() {
        let backend = MemoryBackend::new();
        let created = backend.create_account(" New@Example.com ", "secret1").await.unwrap();
        assert_eq!(created.email, "new@example.com");
        assert_eq!(backend.current_session(), Some(created.clone()));

        backend.end_session(&created).await.unwrap();
        assert!(backend.current_session().is_none());

        let handle = backend.authenticate("new@example.com", "secret1").await.unwrap();
        assert_eq!(handle.uid, created.uid);
        assert_eq!(
            backend.authenticate("new@example.com", "wrong!").await,
            Err(BackendError::InvalidCredentials)
        );
        assert_eq!(
            backend.authenticate("nobody@example.com", "secret1").await,
            Err(BackendError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_create_account_errors() {
        let backend = MemoryBackend::new();
        backend.seed_account("taken@example.com", "secret1").unwrap();

        assert_eq!(
            backend.create_account("taken@example.com", "secret1").await,
            Err(BackendError::EmailInUse)
        );
        assert_eq!(
            backend.create_account("fresh@example.com", "abc").await,
            Err(BackendError::WeakPassword { min: 6 })
        );
        assert!(matches!(
            backend.create_account("not-an-email", "secret1").await,
            Err(BackendError::Unknown(_))
        ));
    }

    #[tokio::test]
    async fn test_save_then_fetch_merges() {
        let backend = MemoryBackend::new();
        let profile = ProfileDraft {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            stick_sim: Some("SIM1".to_string()),
            ..ProfileDraft::default()
        }
        .into_profile("u1", Mode::Personal);

        backend.save_profile("u1", &ProfilePatch::from(&profile)).await.unwrap();
        let patch = ProfilePatch {
            caretaker_number: Some("+1555".to_string()),
            ..ProfilePatch::default()
        };
        backend.save_profile("u1", &patch).await.unwrap();

        let stored = backend.fetch_profile("u1").await.unwrap().unwrap();
        assert_eq!(stored, profile.merged(&patch));
        assert!(backend.fetch_profile("missing").await.unwrap().is_none());

        assert!(backend.save_profile("u2", &patch).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let backend = MemoryBackend::new();
        backend.fail_next(BackendOp::FetchProfile, BackendError::unknown("offline"));
        assert!(backend.fetch_profile("u1").await.is_err());
        assert!(backend.fetch_profile("u1").await.is_ok());
        assert_eq!(backend.calls(BackendOp::FetchProfile), 2);
        assert_eq!(backend.calls(BackendOp::SaveProfile), 0);
    }

    #[tokio::test]
    async fn test_observers_see_sign_in_and_out() {
        let backend = MemoryBackend::new();
        backend.seed_account("a@b.com", "secret1").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = backend.observe_session(Box::new(move |h| {
            sink.lock().unwrap().push(h.is_some());
        }));
        assert_eq!(backend.observer_count(), 1);

        let handle = backend.authenticate("a@b.com", "secret1").await.unwrap();
        backend.end_session(&handle).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);

        drop(sub);
        assert_eq!(backend.observer_count(), 0);
    }

    async fn register(backend: &MemoryBackend<MemoryStore>) -> (SessionHandle, UserProfile) {
        let handle = backend.create_account("ada@example.com", "secret1").await.unwrap();
        let profile = ProfileDraft {
            name: "Ada".to_string(),
            stick_sim: Some("SIM1".to_string()),
            ..ProfileDraft::new("ada@example.com")
        }
        .into_profile(&handle.uid, Mode::Personal);
        backend.save_profile(&handle.uid, &ProfilePatch::from(&profile)).await.unwrap();
        (handle, profile)
    }

    #[tokio::test]
    async fn test_persistent_backend_survives_restart() {
        let store = MemoryStore::new();
        let (handle, profile) = register(&MemoryBackend::persistent(store.clone())).await;

        let restarted = MemoryBackend::persistent(store.clone());
        assert!(restarted.current_session().is_none());
        assert_eq!(restarted.restore_session().await.unwrap(), Some(handle.clone()));
        assert_eq!(restarted.current_session(), Some(handle.clone()));
        assert_eq!(restarted.fetch_profile(&handle.uid).await.unwrap(), Some(profile));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = restarted.observe_session(Box::new(move |h| {
            sink.lock().unwrap().push(h.map(|h| h.uid));
        }));
        assert_eq!(*seen.lock().unwrap(), vec![Some(handle.uid.clone())]);

        // Credentials were kept too.
        restarted.end_session(&handle).await.unwrap();
        let again = restarted.authenticate("ada@example.com", "secret1").await.unwrap();
        assert_eq!(again.uid, handle.uid);
    }

    #[tokio::test]
    async fn test_ended_session_is_not_restored() {
        let store = MemoryStore::new();
        let backend = MemoryBackend::persistent(store.clone());
        let (handle, _) = register(&backend).await;
        backend.end_session(&handle).await.unwrap();

        let restarted = MemoryBackend::persistent(store.clone());
        assert_eq!(restarted.restore_session().await.unwrap(), None);
        assert!(restarted.current_session().is_none());
        assert!(restarted.profile(&handle.uid).is_some());
    }

    #[tokio::test]
    async fn test_session_of_unknown_user_is_dropped() {
        let store = MemoryStore::new();
        SessionCache::with_key(store.clone(), crate::backend::AMBIENT_SESSION_KEY)
            .save(&SessionHandle::new("ghost", "ghost@example.com"))
            .await
            .unwrap();

        let backend = MemoryBackend::persistent(store.clone());
        assert_eq!(backend.restore_session().await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restore_without_store_is_a_noop() {
        let backend = MemoryBackend::new();
        register(&backend).await;
        assert_eq!(backend.restore_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_suspend_parks_operations() {
        let backend = MemoryBackend::new();
        let suspension = backend.suspend().unwrap();
        assert!(backend.suspend().is_none());

        let fetch = backend.fetch_profile("u1");
        let release = async {
            tokio::task::yield_now().await;
            assert_eq!(backend.calls(BackendOp::FetchProfile), 0);
            suspension.resume();
        };
        let (result, _) = tokio::join!(fetch, release);
        assert!(result.unwrap().is_none());
        assert_eq!(backend.calls(BackendOp::FetchProfile), 1);
    }
}
