//! # Session state machine
//!
//! [`SessionMachine`] owns the one piece of global state the app has: who is
//! signed in, in which mode, and whether a session operation is running. It
//! sits between the screens and a [`Backend`]:
//!
//! ```text
//!   screens ──select_mode/login/register/logout/update_profile──▶ SessionMachine ──▶ Backend
//!      ▲                                                            │   ▲
//!      └──────────── watch::Receiver<Session> (snapshots) ──────────┘   └── SessionObserver (ambient changes)
//! ```
//!
//! ## States
//!
//! | Status | `user` | Entered by |
//! |--------|--------|------------|
//! | `Loading` | `None` | startup, `login`, `register`, `logout` in flight |
//! | `Unauthenticated` | `None` | failed sign-in, logout, ambient sign-out |
//! | `Authenticated` | `Some` | successful sign-in or ambient rehydration |
//!
//! `user` is present exactly when the status is `Authenticated`, and then
//! `selected_mode == Some(user.mode)`. A profile update runs while the status
//! stays `Authenticated`; its progress shows in [`Session::pending`].
//!
//! ## Concurrency
//!
//! At most one manual operation runs at a time. Starting another while one is
//! pending fails fast with [`AuthError::SessionBusy`] and changes nothing.
//! Ambient notifications that arrive while an operation is pending are
//! ignored; the operation's own outcome is the truth. Every applied transition
//! advances an epoch, and an ambient result whose epoch is stale when it comes
//! back from the backend is discarded.
//!
//! If a caller drops an operation future before it settles, the pending marker
//! is cleared and a `Loading` status falls back to `Unauthenticated`.
//!
//! ## Local cache
//!
//! The signed-in profile is written to the [`SessionCache`] after the backend
//! confirmed it and removed on sign-out. It is read only when the backend
//! reports an ambient session but the profile fetch fails in transit.
//!
//! ## Restarts
//!
//! Backends built over a store keep their open session themselves.
//! [`SessionMachine::resume`] asks the backend to restore it before attaching,
//! so the first ambient notification after a restart signs the user back in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::{Backend, Mode, ProfileDraft, ProfilePatch, SessionHandle, Subscription, UserProfile};
use store::{KeyValueStore, MemoryStore, SessionCache};
use tokio::sync::{mpsc, watch};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Unauthenticated,
    Authenticated,
}

/// A manual session operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Login,
    Register,
    Logout,
    UpdateProfile,
}

/// Snapshot of the session as the screens see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub user: Option<UserProfile>,
    pub selected_mode: Option<Mode>,
    /// The manual operation currently in flight.
    pub pending: Option<Operation>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            status: SessionStatus::Loading,
            user: None,
            selected_mode: None,
            pending: None,
        }
    }
}

impl Session {
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && self.user.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Mode of the signed-in user.
    pub fn mode(&self) -> Option<Mode> {
        self.user.as_ref().map(|u| u.mode)
    }
}

struct MachineState {
    session: Session,
    handle: Option<SessionHandle>,
    epoch: u64,
}

impl MachineState {
    fn sign_out(&mut self) {
        self.session.status = SessionStatus::Unauthenticated;
        self.session.user = None;
        self.handle = None;
    }

    fn sign_in(&mut self, handle: SessionHandle, profile: UserProfile) {
        self.session.status = SessionStatus::Authenticated;
        self.session.selected_mode = Some(profile.mode);
        self.session.user = Some(profile);
        self.handle = Some(handle);
    }

    fn start_loading(&mut self) {
        self.session.status = SessionStatus::Loading;
        self.session.user = None;
        self.handle = None;
    }
}

struct Shared<B, S> {
    backend: B,
    cache: Option<SessionCache<S>>,
    state: Mutex<MachineState>,
    snapshots: watch::Sender<Session>,
}

/// Authoritative session state plus the operations that change it.
///
/// Cloning is cheap and every clone drives the same session.
pub struct SessionMachine<B, S = MemoryStore> {
    shared: Arc<Shared<B, S>>,
}

impl<B, S> Clone for SessionMachine<B, S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<B: Backend> SessionMachine<B, MemoryStore> {
    /// A machine that keeps nothing locally.
    pub fn new(backend: B) -> Self {
        Self::from_parts(backend, None)
    }
}

impl<B: Backend, S: KeyValueStore> SessionMachine<B, S> {
    pub fn with_cache(backend: B, cache: SessionCache<S>) -> Self {
        Self::from_parts(backend, Some(cache))
    }

    pub fn from_parts(backend: B, cache: Option<SessionCache<S>>) -> Self {
        let session = Session::default();
        let (snapshots, _) = watch::channel(session.clone());
        Self {
            shared: Arc::new(Shared {
                backend,
                cache,
                state: Mutex::new(MachineState {
                    session,
                    handle: None,
                    epoch: 0,
                }),
                snapshots,
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    pub fn snapshot(&self) -> Session {
        self.state().session.clone()
    }

    /// Receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.snapshots.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, MachineState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: Session) {
        tracing::debug!(
            status = ?snapshot.status,
            pending = ?snapshot.pending,
            mode = ?snapshot.selected_mode,
            "session transition"
        );
        self.shared.snapshots.send_replace(snapshot);
    }

    /// Apply a transition and advance the epoch.
    fn transition<R>(&self, apply: impl FnOnce(&mut MachineState) -> R) -> R {
        let (result, snapshot) = {
            let mut state = self.state();
            let result = apply(&mut state);
            state.epoch += 1;
            (result, state.session.clone())
        };
        self.publish(snapshot);
        result
    }

    /// Mark `op` as pending, after `prepare` accepted the current state.
    ///
    /// Nothing changes when another operation is pending or `prepare` fails.
    fn begin<T>(
        &self,
        op: Operation,
        prepare: impl FnOnce(&mut MachineState) -> Result<T, AuthError>,
    ) -> Result<(InFlight<'_, B, S>, T), AuthError> {
        let (value, snapshot) = {
            let mut state = self.state();
            if let Some(running) = state.session.pending {
                tracing::debug!("rejecting {:?} while {:?} is pending", op, running);
                return Err(AuthError::SessionBusy);
            }
            let value = prepare(&mut state)?;
            state.session.pending = Some(op);
            state.epoch += 1;
            (value, state.session.clone())
        };
        self.publish(snapshot);
        Ok((
            InFlight {
                machine: self,
                op,
                settled: false,
            },
            value,
        ))
    }

    /// Choose the account kind before signing in or registering.
    pub fn select_mode(&self, mode: Mode) -> Result<(), AuthError> {
        let snapshot = {
            let mut state = self.state();
            if state.session.pending.is_some() {
                return Err(AuthError::SessionBusy);
            }
            if state.session.status == SessionStatus::Authenticated {
                return Err(AuthError::AlreadyAuthenticated);
            }
            // Does not advance the epoch: a rehydration in flight still applies.
            state.session.selected_mode = Some(mode);
            state.session.clone()
        };
        self.publish(snapshot);
        Ok(())
    }

    /// Sign in with email and password in the selected mode.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::validation("Please enter your email and password"));
        }

        let (op, mode) = self.begin(Operation::Login, |state| {
            if state.session.status == SessionStatus::Authenticated {
                return Err(AuthError::AlreadyAuthenticated);
            }
            let mode = state
                .session
                .selected_mode
                .ok_or_else(|| AuthError::validation("Please select a mode first"))?;
            state.start_loading();
            Ok(mode)
        })?;

        let backend = &self.shared.backend;
        let handle = match backend.authenticate(email, password).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::info!("Login failed for {}: {}", email, e);
                op.settle(MachineState::sign_out);
                return Err(AuthError::from_login(e));
            }
        };

        let profile = match backend.fetch_profile(&handle.uid).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!("No profile stored for user {}", handle.uid);
                self.end_backend_session(&handle).await;
                op.settle(MachineState::sign_out);
                return Err(AuthError::ProfileNotFound);
            }
            Err(e) => {
                tracing::error!("Failed to fetch profile for {}: {}", handle.uid, e);
                self.end_backend_session(&handle).await;
                op.settle(MachineState::sign_out);
                return Err(AuthError::Unknown(e.to_string()));
            }
        };

        if profile.mode != mode {
            tracing::info!(
                "User {} is registered as {}, rejecting {} login",
                handle.uid,
                profile.mode,
                mode
            );
            self.end_backend_session(&handle).await;
            op.settle(MachineState::sign_out);
            return Err(AuthError::ModeMismatch {
                expected: mode,
                actual: profile.mode,
            });
        }

        self.write_cache(&profile).await;
        tracing::info!("User {} signed in ({})", handle.uid, profile.mode);
        let user = profile.clone();
        op.settle(move |state| state.sign_in(handle, user));
        Ok(profile)
    }

    /// Create an account and its profile, then sign in.
    ///
    /// The draft's mode defaults to the selected mode; a draft mode that
    /// contradicts an explicit selection is rejected.
    pub async fn register(&self, draft: ProfileDraft, password: &str) -> Result<UserProfile, AuthError> {
        let email = draft.email.trim().to_string();
        if email.is_empty() {
            return Err(AuthError::validation("Email is required"));
        }
        if password.is_empty() {
            return Err(AuthError::validation("Password is required"));
        }

        let draft_mode = draft.mode;
        let (op, mode) = self.begin(Operation::Register, |state| {
            if state.session.status == SessionStatus::Authenticated {
                return Err(AuthError::AlreadyAuthenticated);
            }
            let mode = match (draft_mode, state.session.selected_mode) {
                (Some(requested), Some(selected)) if requested != selected => {
                    return Err(AuthError::ModeMismatch {
                        expected: selected,
                        actual: requested,
                    });
                }
                (Some(mode), _) | (None, Some(mode)) => mode,
                (None, None) => return Err(AuthError::validation("Please select a mode first")),
            };
            state.start_loading();
            state.session.selected_mode = Some(mode);
            Ok(mode)
        })?;

        let backend = &self.shared.backend;
        let handle = match backend.create_account(&email, password).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::info!("Registration failed for {}: {}", email, e);
                op.settle(MachineState::sign_out);
                return Err(AuthError::from_registration(e));
            }
        };

        let profile = draft.into_profile(&handle.uid, mode);
        if let Err(e) = backend.save_profile(&handle.uid, &ProfilePatch::from(&profile)).await {
            tracing::error!("Failed to store profile for new user {}: {}", handle.uid, e);
            self.end_backend_session(&handle).await;
            op.settle(MachineState::sign_out);
            return Err(AuthError::RegistrationFailed(e.to_string()));
        }

        self.write_cache(&profile).await;
        tracing::info!("Registered user {} ({})", handle.uid, mode);
        let user = profile.clone();
        op.settle(move |state| state.sign_in(handle, user));
        Ok(profile)
    }

    /// Sign out from any state.
    ///
    /// Ending the backend session is best-effort: a failure is logged and
    /// the local state is cleared anyway.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let (op, handle) = self.begin(Operation::Logout, |state| {
            let handle = state.handle.take();
            state.start_loading();
            state.session.selected_mode = None;
            Ok(handle)
        })?;

        if let Some(handle) = &handle {
            self.end_backend_session(handle).await;
        }
        self.clear_cache().await;

        op.settle(|state| {
            state.sign_out();
            state.session.selected_mode = None;
        });
        if let Some(handle) = handle {
            tracing::info!("User {} signed out", handle.uid);
        }
        Ok(())
    }

    /// Save editable profile fields of the signed-in user.
    ///
    /// `email`, `stick_sim` and `mode` are fixed at registration: a patch that
    /// sets any of them fails with [`AuthError::UpdateFailed`] before the
    /// backend is called. On failure the user stays as it was.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<UserProfile, AuthError> {
        if patch.is_empty() {
            let state = self.state();
            if state.session.pending.is_some() {
                return Err(AuthError::SessionBusy);
            }
            return match (&state.session.status, &state.session.user) {
                (SessionStatus::Authenticated, Some(user)) => Ok(user.clone()),
                _ => Err(AuthError::NoActiveSession),
            };
        }

        let (op, current) = self.begin(Operation::UpdateProfile, |state| {
            let user = match (&state.session.status, &state.session.user) {
                (SessionStatus::Authenticated, Some(user)) => user.clone(),
                _ => return Err(AuthError::NoActiveSession),
            };
            if patch.touches_identity() {
                tracing::info!("Rejecting identity change in profile update for {}", user.id);
                return Err(AuthError::UpdateFailed(
                    "Email, stick SIM and mode cannot be changed".to_string(),
                ));
            }
            Ok(user)
        })?;

        if let Err(e) = self.shared.backend.save_profile(&current.id, &patch).await {
            tracing::warn!("Profile update for {} failed: {}", current.id, e);
            op.settle(|_| {});
            return Err(AuthError::UpdateFailed(e.to_string()));
        }

        let updated = current.merged(&patch);
        self.write_cache(&updated).await;
        let user = updated.clone();
        op.settle(move |state| state.session.user = Some(user));
        Ok(updated)
    }

    /// Reconcile with an ambient session change reported by the backend.
    ///
    /// `None` means the backend has no session. `Some` rehydrates the user
    /// unless that user is already signed in here.
    pub async fn on_session_change(&self, handle: Option<SessionHandle>) {
        let epoch = {
            let state = self.state();
            if let Some(op) = state.session.pending {
                tracing::debug!("Ignoring ambient session change while {:?} is pending", op);
                return;
            }
            if let (Some(incoming), Some(current)) = (&handle, &state.handle) {
                if state.session.status == SessionStatus::Authenticated && incoming.uid == current.uid {
                    return;
                }
            }
            state.epoch
        };

        let Some(handle) = handle else {
            let applied = self.transition_if_current(epoch, |state| {
                state.sign_out();
            });
            if applied.is_some() {
                self.clear_cache().await;
            }
            return;
        };

        let outcome = match self.shared.backend.fetch_profile(&handle.uid).await {
            Ok(Some(profile)) => Rehydrated::Fresh(profile),
            Ok(None) => Rehydrated::Missing,
            Err(e) => {
                tracing::warn!("Could not fetch profile for {}: {}", handle.uid, e);
                match self.read_cache().await {
                    Some(cached) if cached.id == handle.uid => {
                        tracing::info!("Using cached profile for {}", handle.uid);
                        Rehydrated::Cached(cached)
                    }
                    _ => Rehydrated::Unavailable,
                }
            }
        };

        let session_handle = handle.clone();
        let applied = self.transition_if_current(epoch, move |state| match outcome {
            Rehydrated::Fresh(profile) | Rehydrated::Cached(profile) => {
                if let Some(selected) = state.session.selected_mode {
                    if selected != profile.mode {
                        tracing::info!(
                            "Ambient user {} is {} but {} is selected",
                            profile.id,
                            profile.mode,
                            selected
                        );
                        state.sign_out();
                        return Settled::EndSession;
                    }
                }
                state.sign_in(session_handle, profile.clone());
                Settled::SignedIn(profile)
            }
            Rehydrated::Missing => {
                state.sign_out();
                Settled::EndSession
            }
            Rehydrated::Unavailable => {
                state.sign_out();
                Settled::SignedOut
            }
        });

        match applied {
            None => tracing::debug!("Discarding stale ambient session for {}", handle.uid),
            Some(Settled::SignedIn(profile)) => {
                tracing::info!("Restored session for {} ({})", profile.id, profile.mode);
                self.write_cache(&profile).await;
            }
            Some(Settled::EndSession) => {
                self.end_backend_session(&handle).await;
                self.clear_cache().await;
            }
            Some(Settled::SignedOut) => {}
        }
    }

    /// Apply an ambient transition unless the state moved on since `epoch`.
    fn transition_if_current<R>(
        &self,
        epoch: u64,
        apply: impl FnOnce(&mut MachineState) -> R,
    ) -> Option<R> {
        let (result, snapshot) = {
            let mut state = self.state();
            if state.epoch != epoch || state.session.pending.is_some() {
                return None;
            }
            let result = apply(&mut state);
            state.epoch += 1;
            (result, state.session.clone())
        };
        self.publish(snapshot);
        Some(result)
    }

    /// Restore the session a previous run left open, then attach.
    ///
    /// This is the startup path: the observer's first notification carries
    /// the restored session (or `None`) and rehydrates the machine.
    pub async fn resume(&self) -> SessionObserver<B, S> {
        match self.shared.backend.restore_session().await {
            Ok(Some(handle)) => tracing::info!("Found a stored session for {}", handle.uid),
            Ok(None) => tracing::debug!("No stored session to restore"),
            Err(e) => tracing::warn!("Failed to restore the stored session: {}", e),
        }
        self.attach()
    }

    /// Register with the backend for ambient session changes.
    ///
    /// The backend reports the current session right away, so running the
    /// returned observer also performs the startup rehydration.
    pub fn attach(&self) -> SessionObserver<B, S> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.shared.backend.observe_session(Box::new(move |handle| {
            let _ = tx.send(handle);
        }));
        SessionObserver {
            machine: self.clone(),
            events: rx,
            _subscription: subscription,
        }
    }

    async fn end_backend_session(&self, handle: &SessionHandle) {
        if let Err(e) = self.shared.backend.end_session(handle).await {
            tracing::warn!("Failed to end backend session for {}: {}", handle.uid, e);
        }
    }

    async fn write_cache(&self, profile: &UserProfile) {
        if let Some(cache) = &self.shared.cache {
            if let Err(e) = cache.save(profile).await {
                tracing::warn!("Failed to cache session user: {}", e);
            }
        }
    }

    async fn clear_cache(&self) {
        if let Some(cache) = &self.shared.cache {
            if let Err(e) = cache.clear().await {
                tracing::warn!("Failed to clear cached session user: {}", e);
            }
        }
    }

    async fn read_cache(&self) -> Option<UserProfile> {
        let cache = self.shared.cache.as_ref()?;
        match cache.load::<UserProfile>().await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached session user: {}", e);
                None
            }
        }
    }
}

enum Rehydrated {
    Fresh(UserProfile),
    Cached(UserProfile),
    Missing,
    Unavailable,
}

enum Settled {
    SignedIn(UserProfile),
    EndSession,
    SignedOut,
}

/// Pending marker of a running manual operation.
struct InFlight<'a, B: Backend, S: KeyValueStore> {
    machine: &'a SessionMachine<B, S>,
    op: Operation,
    settled: bool,
}

impl<B: Backend, S: KeyValueStore> InFlight<'_, B, S> {
    /// Clear the pending marker and apply the operation's outcome.
    fn settle(mut self, apply: impl FnOnce(&mut MachineState)) {
        self.settled = true;
        self.machine.transition(|state| {
            state.session.pending = None;
            apply(state);
        });
    }
}

impl<B: Backend, S: KeyValueStore> Drop for InFlight<'_, B, S> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!("{:?} was abandoned before it finished", self.op);
        self.machine.transition(|state| {
            state.session.pending = None;
            if state.session.status == SessionStatus::Loading {
                state.sign_out();
            }
        });
    }
}

/// Feeds ambient session changes from the backend into a [`SessionMachine`].
///
/// Dropping it unsubscribes from the backend.
pub struct SessionObserver<B, S> {
    machine: SessionMachine<B, S>,
    events: mpsc::UnboundedReceiver<Option<SessionHandle>>,
    _subscription: Subscription,
}

impl<B: Backend, S: KeyValueStore> SessionObserver<B, S> {
    /// Process changes until the backend goes away. Only the latest of
    /// several queued changes is applied.
    pub async fn run(mut self) {
        while let Some(first) = self.events.recv().await {
            let latest = self.latest_after(first);
            self.machine.on_session_change(latest).await;
        }
    }

    /// Apply whatever is queued right now. Returns whether anything was.
    pub async fn process_pending(&mut self) -> bool {
        let Ok(first) = self.events.try_recv() else {
            return false;
        };
        let latest = self.latest_after(first);
        self.machine.on_session_change(latest).await;
        true
    }

    fn latest_after(&mut self, mut latest: Option<SessionHandle>) -> Option<SessionHandle> {
        while let Ok(newer) = self.events.try_recv() {
            latest = newer;
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::backend::BackendOp;
    use api::{BackendError, MemoryBackend};

    const EMAIL: &str = "ada@example.com";
    const PASSWORD: &str = "secret1";

    fn seeded(mode: Mode) -> (MemoryBackend, UserProfile) {
        let backend = MemoryBackend::new();
        let uid = backend.seed_account(EMAIL, PASSWORD).unwrap();
        let profile = ProfileDraft {
            name: "Ada".to_string(),
            stick_sim: Some("SIM123456".to_string()),
            age: Some(36),
            ..ProfileDraft::new(EMAIL)
        }
        .into_profile(&uid, mode);
        backend.seed_profile(profile.clone());
        (backend, profile)
    }

    fn machine(backend: &MemoryBackend) -> (SessionMachine<MemoryBackend, MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        let machine = SessionMachine::with_cache(backend.clone(), SessionCache::new(store.clone()));
        (machine, store)
    }

    async fn cached(store: &MemoryStore) -> Option<UserProfile> {
        SessionCache::new(store.clone()).load().await.unwrap()
    }

    fn assert_consistent(session: &Session) {
        assert_eq!(session.user.is_some(), session.status == SessionStatus::Authenticated);
        if let Some(user) = &session.user {
            assert_eq!(session.selected_mode, Some(user.mode));
        }
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let machine = SessionMachine::new(MemoryBackend::new());
        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Loading);
        assert!(session.user.is_none());
        assert!(session.selected_mode.is_none());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_login_success_caches_user() {
        let (backend, profile) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();

        let user = machine.login(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(user, profile);

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.user.as_ref(), Some(&profile));
        assert_eq!(session.pending, None);
        assert_consistent(&session);
        assert_eq!(cached(&store).await, Some(profile));
    }

    #[tokio::test]
    async fn test_login_mode_mismatch_ends_backend_session() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Ngo).unwrap();

        let err = machine.login(EMAIL, PASSWORD).await.unwrap_err();
        assert_eq!(
            err,
            AuthError::ModeMismatch {
                expected: Mode::Ngo,
                actual: Mode::Personal
            }
        );

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert!(session.user.is_none());
        assert_eq!(session.selected_mode, Some(Mode::Ngo));
        assert!(backend.current_session().is_none());
        assert_eq!(backend.calls(BackendOp::EndSession), 1);
        assert_eq!(cached(&store).await, None);
    }

    #[tokio::test]
    async fn test_login_without_profile() {
        let backend = MemoryBackend::new();
        backend.seed_account(EMAIL, PASSWORD).unwrap();
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();

        assert_eq!(
            machine.login(EMAIL, PASSWORD).await.unwrap_err(),
            AuthError::ProfileNotFound
        );
        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
        assert!(backend.current_session().is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();

        assert_eq!(
            machine.login(EMAIL, "wrong-password").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert_eq!(session.pending, None);
        assert_eq!(backend.calls(BackendOp::FetchProfile), 0);
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        backend.fail_next(BackendOp::Authenticate, BackendError::RateLimited);

        assert_eq!(
            machine.login(EMAIL, PASSWORD).await.unwrap_err(),
            AuthError::RateLimited
        );
    }

    #[tokio::test]
    async fn test_validation_never_reaches_backend() {
        let backend = MemoryBackend::new();
        let (machine, _) = machine(&backend);

        assert!(matches!(
            machine.login("  ", PASSWORD).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            machine.login(EMAIL, "").await,
            Err(AuthError::Validation(_))
        ));
        // No mode selected yet.
        assert!(matches!(
            machine.login(EMAIL, PASSWORD).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            machine.register(ProfileDraft::new(""), PASSWORD).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            machine.register(ProfileDraft::new(EMAIL), PASSWORD).await,
            Err(AuthError::Validation(_))
        ));

        assert_eq!(backend.calls(BackendOp::Authenticate), 0);
        assert_eq!(backend.calls(BackendOp::CreateAccount), 0);
        // Rejected input leaves the startup state alone.
        assert_eq!(machine.snapshot().status, SessionStatus::Loading);
    }

    #[tokio::test]
    async fn test_register_uses_selected_mode() {
        let backend = MemoryBackend::new();
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Ngo).unwrap();

        let draft = ProfileDraft {
            name: "Helping Hands".to_string(),
            ngo_name: Some("Helping Hands".to_string()),
            ngo_mobile: Some("+91 98765 43210".to_string()),
            ..ProfileDraft::new("contact@helpinghands.org")
        };
        let user = machine.register(draft, PASSWORD).await.unwrap();

        assert_eq!(user.mode, Mode::Ngo);
        assert_eq!(user.ngo_email.as_deref(), Some("contact@helpinghands.org"));
        assert_eq!(backend.profile(&user.id), Some(user.clone()));
        assert_eq!(cached(&store).await, Some(user.clone()));

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_consistent(&session);
    }

    #[tokio::test]
    async fn test_register_conflicting_mode() {
        let backend = MemoryBackend::new();
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();

        let draft = ProfileDraft {
            mode: Some(Mode::Ngo),
            ..ProfileDraft::new(EMAIL)
        };
        assert_eq!(
            machine.register(draft, PASSWORD).await.unwrap_err(),
            AuthError::ModeMismatch {
                expected: Mode::Personal,
                actual: Mode::Ngo
            }
        );
        assert_eq!(backend.calls(BackendOp::CreateAccount), 0);
    }

    #[tokio::test]
    async fn test_register_email_in_use_and_weak_password() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();

        assert_eq!(
            machine.register(ProfileDraft::new(EMAIL), PASSWORD).await.unwrap_err(),
            AuthError::EmailInUse
        );
        assert!(matches!(
            machine
                .register(ProfileDraft::new("new@example.com"), "123")
                .await
                .unwrap_err(),
            AuthError::WeakPassword { .. }
        ));
        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_register_profile_write_failure_ends_session() {
        let backend = MemoryBackend::new();
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        backend.fail_next(BackendOp::SaveProfile, BackendError::unknown("quota exceeded"));

        let err = machine
            .register(ProfileDraft::new(EMAIL), PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::RegistrationFailed(msg) if msg.contains("quota exceeded")));
        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
        assert!(backend.current_session().is_none());
        assert_eq!(cached(&store).await, None);
    }

    #[tokio::test]
    async fn test_select_mode_rules() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);

        machine.select_mode(Mode::Ngo).unwrap();
        machine.select_mode(Mode::Personal).unwrap();
        assert_eq!(machine.snapshot().selected_mode, Some(Mode::Personal));

        machine.login(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(
            machine.select_mode(Mode::Ngo),
            Err(AuthError::AlreadyAuthenticated)
        );
        assert_eq!(machine.snapshot().selected_mode, Some(Mode::Personal));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();

        machine.logout().await.unwrap();

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert!(session.user.is_none());
        assert!(session.selected_mode.is_none());
        assert!(backend.current_session().is_none());
        assert_eq!(cached(&store).await, None);
    }

    #[tokio::test]
    async fn test_logout_survives_backend_failure() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();
        backend.fail_next(BackendOp::EndSession, BackendError::unknown("offline"));

        machine.logout().await.unwrap();

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert!(session.user.is_none());
        assert_eq!(cached(&store).await, None);
    }

    #[tokio::test]
    async fn test_logout_from_any_state() {
        let backend = MemoryBackend::new();
        let (machine, _) = machine(&backend);

        // Startup, before any rehydration.
        machine.logout().await.unwrap();
        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);

        // Already signed out.
        machine.select_mode(Mode::Ngo).unwrap();
        machine.logout().await.unwrap();
        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert!(session.selected_mode.is_none());
        assert_eq!(backend.calls(BackendOp::EndSession), 0);
    }

    #[tokio::test]
    async fn test_update_profile_merges_and_caches() {
        let (backend, profile) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();

        let updated = machine
            .update_profile(ProfilePatch {
                name: Some("Ada L.".to_string()),
                caretaker_number: Some("555-0100".to_string()),
                ..ProfilePatch::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.caretaker_number.as_deref(), Some("555-0100"));
        assert_eq!(updated.stick_sim, profile.stick_sim);
        assert_eq!(machine.snapshot().user, Some(updated.clone()));
        assert_eq!(backend.profile(&profile.id), Some(updated.clone()));
        assert_eq!(cached(&store).await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_identity_fields() {
        let (backend, profile) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();
        let before = machine.snapshot();

        for patch in [
            ProfilePatch {
                stick_sim: Some("NEW".to_string()),
                ..ProfilePatch::default()
            },
            ProfilePatch {
                email: Some("other@example.com".to_string()),
                name: Some("Ada L.".to_string()),
                ..ProfilePatch::default()
            },
            ProfilePatch {
                mode: Some(Mode::Ngo),
                ..ProfilePatch::default()
            },
        ] {
            let err = machine.update_profile(patch).await.unwrap_err();
            assert!(matches!(err, AuthError::UpdateFailed(_)));
        }

        assert_eq!(machine.snapshot(), before);
        assert_eq!(backend.calls(BackendOp::SaveProfile), 0);
        assert_eq!(backend.profile(&profile.id), Some(profile.clone()));
        assert_eq!(cached(&store).await, Some(profile));
    }

    #[tokio::test]
    async fn test_stick_sim_change_fails_against_rejecting_backend() {
        let (backend, profile) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();
        backend.fail_next(BackendOp::SaveProfile, BackendError::unknown("rejected"));

        let result = machine
            .update_profile(ProfilePatch {
                stick_sim: Some("NEW".to_string()),
                ..ProfilePatch::default()
            })
            .await;

        assert!(matches!(result, Err(AuthError::UpdateFailed(_))));
        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.user, Some(profile.clone()));
        assert_eq!(session.pending, None);
        assert_eq!(
            session.user.and_then(|u| u.stick_sim),
            profile.stick_sim
        );
    }

    #[tokio::test]
    async fn test_update_profile_failure_keeps_user() {
        let (backend, profile) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();
        backend.fail_next(BackendOp::SaveProfile, BackendError::unknown("permission denied"));

        let err = machine
            .update_profile(ProfilePatch {
                name: Some("Changed".to_string()),
                ..ProfilePatch::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UpdateFailed(_)));
        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.user, Some(profile));
        assert_eq!(session.pending, None);
    }

    #[tokio::test]
    async fn test_update_profile_requires_session() {
        let machine = SessionMachine::new(MemoryBackend::new());
        let patch = ProfilePatch {
            name: Some("Nobody".to_string()),
            ..ProfilePatch::default()
        };
        assert_eq!(
            machine.update_profile(patch).await.unwrap_err(),
            AuthError::NoActiveSession
        );
        assert_eq!(
            machine.update_profile(ProfilePatch::default()).await.unwrap_err(),
            AuthError::NoActiveSession
        );
    }

    #[tokio::test]
    async fn test_second_operation_while_busy_is_rejected() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        let gate = backend.suspend().unwrap();

        let other = machine.clone();
        let meanwhile = async move {
            while other.snapshot().pending.is_none() {
                tokio::task::yield_now().await;
            }
            let during = other.snapshot();
            let second = other.login(EMAIL, PASSWORD).await;
            let logout = other.logout().await;
            let mode = other.select_mode(Mode::Ngo);
            gate.resume();
            (during, second, logout, mode)
        };

        let (first, (during, second, logout, mode)) = tokio::join!(machine.login(EMAIL, PASSWORD), meanwhile);

        assert_eq!(during.status, SessionStatus::Loading);
        assert_eq!(during.pending, Some(Operation::Login));
        assert_eq!(second.unwrap_err(), AuthError::SessionBusy);
        assert_eq!(logout.unwrap_err(), AuthError::SessionBusy);
        assert_eq!(mode.unwrap_err(), AuthError::SessionBusy);
        assert!(first.is_ok());
        assert_eq!(backend.calls(BackendOp::Authenticate), 1);
        assert_eq!(machine.snapshot().status, SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_profile_update_keeps_authenticated_while_pending() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();
        let gate = backend.suspend().unwrap();

        let other = machine.clone();
        let meanwhile = async move {
            while other.snapshot().pending.is_none() {
                tokio::task::yield_now().await;
            }
            let during = other.snapshot();
            gate.resume();
            during
        };
        let patch = ProfilePatch {
            gender: Some("Female".to_string()),
            ..ProfilePatch::default()
        };
        let (updated, during) = tokio::join!(machine.update_profile(patch), meanwhile);

        assert_eq!(during.status, SessionStatus::Authenticated);
        assert_eq!(during.pending, Some(Operation::UpdateProfile));
        assert_consistent(&during);
        assert_eq!(updated.unwrap().gender.as_deref(), Some("Female"));
    }

    #[tokio::test]
    async fn test_abandoned_operation_settles() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        let gate = backend.suspend().unwrap();

        tokio::select! {
            biased;
            _ = machine.login(EMAIL, PASSWORD) => panic!("login cannot finish while suspended"),
            _ = std::future::ready(()) => {}
        }
        gate.resume();

        let session = machine.snapshot();
        assert_eq!(session.pending, None);
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        // The machine accepts new work afterwards.
        machine.login(EMAIL, PASSWORD).await.unwrap();
    }

    #[tokio::test]
    async fn test_ambient_change_ignored_while_busy() {
        let (backend, profile) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Personal).unwrap();
        let gate = backend.suspend().unwrap();

        let other = machine.clone();
        let ambient = SessionHandle::new(profile.id.clone(), EMAIL);
        let meanwhile = async move {
            while other.snapshot().pending.is_none() {
                tokio::task::yield_now().await;
            }
            other.on_session_change(None).await;
            other.on_session_change(Some(ambient)).await;
            let during = other.snapshot();
            gate.resume();
            during
        };
        let (_, during) = tokio::join!(machine.login(EMAIL, "wrong-password"), meanwhile);

        assert_eq!(during.status, SessionStatus::Loading);
        assert_eq!(during.pending, Some(Operation::Login));
        assert_eq!(backend.calls(BackendOp::FetchProfile), 0);
        // The login's own failure is what sticks.
        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_rehydration_sets_mode() {
        let (backend, profile) = seeded(Mode::Ngo);
        backend.authenticate(EMAIL, PASSWORD).await.unwrap();
        let (machine, store) = machine(&backend);

        let mut observer = machine.attach();
        assert!(observer.process_pending().await);

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.selected_mode, Some(Mode::Ngo));
        assert_eq!(session.user, Some(profile.clone()));
        assert_eq!(cached(&store).await, Some(profile));
    }

    #[tokio::test]
    async fn test_rehydration_without_session() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        SessionCache::new(store.clone()).save(&"stale").await.unwrap();
        machine.select_mode(Mode::Personal).unwrap();

        let mut observer = machine.attach();
        assert!(observer.process_pending().await);

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert_eq!(session.selected_mode, Some(Mode::Personal));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_rehydration_mode_mismatch_signs_out() {
        let (backend, _) = seeded(Mode::Personal);
        backend.authenticate(EMAIL, PASSWORD).await.unwrap();
        let (machine, _) = machine(&backend);
        machine.select_mode(Mode::Ngo).unwrap();

        let mut observer = machine.attach();
        observer.process_pending().await;

        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
        assert!(backend.current_session().is_none());
    }

    #[tokio::test]
    async fn test_rehydration_falls_back_to_cache_when_offline() {
        let (backend, profile) = seeded(Mode::Personal);
        backend.authenticate(EMAIL, PASSWORD).await.unwrap();
        let (machine, store) = machine(&backend);
        SessionCache::new(store.clone()).save(&profile).await.unwrap();
        backend.fail_next(BackendOp::FetchProfile, BackendError::unknown("network unreachable"));

        let mut observer = machine.attach();
        observer.process_pending().await;

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.user, Some(profile));
    }

    #[tokio::test]
    async fn test_rehydration_offline_without_cache() {
        let (backend, _) = seeded(Mode::Personal);
        backend.authenticate(EMAIL, PASSWORD).await.unwrap();
        let (machine, _) = machine(&backend);
        backend.fail_next(BackendOp::FetchProfile, BackendError::unknown("network unreachable"));

        let mut observer = machine.attach();
        observer.process_pending().await;

        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
        // A transport failure is not a reason to end the backend session.
        assert!(backend.current_session().is_some());
    }

    #[tokio::test]
    async fn test_ambient_sign_out_after_login() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, store) = machine(&backend);
        let mut observer = machine.attach();
        observer.process_pending().await;

        machine.select_mode(Mode::Personal).unwrap();
        machine.login(EMAIL, PASSWORD).await.unwrap();
        // The sign-in notification is a no-op for the same user.
        observer.process_pending().await;
        assert_eq!(backend.calls(BackendOp::FetchProfile), 1);
        assert!(machine.snapshot().is_authenticated());

        let handle = backend.current_session().unwrap();
        backend.end_session(&handle).await.unwrap();
        observer.process_pending().await;

        let session = machine.snapshot();
        assert_eq!(session.status, SessionStatus::Unauthenticated);
        assert_eq!(session.selected_mode, Some(Mode::Personal));
        assert_eq!(cached(&store).await, None);
    }

    #[tokio::test]
    async fn test_snapshots_are_published() {
        let (backend, _) = seeded(Mode::Personal);
        let (machine, _) = machine(&backend);
        let mut rx = machine.subscribe();

        machine.select_mode(Mode::Personal).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().selected_mode, Some(Mode::Personal));

        machine.login(EMAIL, PASSWORD).await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());
    }

    fn restarted(store: &MemoryStore) -> SessionMachine<MemoryBackend, MemoryStore> {
        SessionMachine::with_cache(
            MemoryBackend::persistent(store.clone()),
            SessionCache::new(store.clone()),
        )
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let store = MemoryStore::new();
        let user = {
            let machine = restarted(&store);
            machine.select_mode(Mode::Ngo).unwrap();
            let draft = ProfileDraft {
                name: "Helping Hands".to_string(),
                ngo_name: Some("Helping Hands".to_string()),
                ngo_mobile: Some("+91 98765 43210".to_string()),
                ..ProfileDraft::new(EMAIL)
            };
            machine.register(draft, PASSWORD).await.unwrap()
        };

        let machine = restarted(&store);
        assert!(machine.snapshot().is_loading());
        let mut observer = machine.resume().await;
        assert!(observer.process_pending().await);

        let session = machine.snapshot();
        assert_consistent(&session);
        assert_eq!(session.status, SessionStatus::Authenticated);
        assert_eq!(session.selected_mode, Some(Mode::Ngo));
        assert_eq!(session.user, Some(user.clone()));
        assert_eq!(cached(&store).await, Some(user));
    }

    #[tokio::test]
    async fn test_logout_is_kept_across_restart() {
        let store = MemoryStore::new();
        {
            let machine = restarted(&store);
            machine.select_mode(Mode::Personal).unwrap();
            let draft = ProfileDraft {
                name: "Ada".to_string(),
                ..ProfileDraft::new(EMAIL)
            };
            machine.register(draft, PASSWORD).await.unwrap();
            machine.logout().await.unwrap();
        }

        let machine = restarted(&store);
        let mut observer = machine.resume().await;
        observer.process_pending().await;

        assert_eq!(machine.snapshot().status, SessionStatus::Unauthenticated);
        assert_eq!(cached(&store).await, None);

        // The account itself is still there.
        machine.select_mode(Mode::Personal).unwrap();
        assert!(machine.login(EMAIL, PASSWORD).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropping_observer_unsubscribes() {
        let backend = MemoryBackend::new();
        let machine = SessionMachine::new(backend.clone());
        let observer = machine.attach();
        assert_eq!(backend.observer_count(), 1);
        drop(observer);
        assert_eq!(backend.observer_count(), 0);
    }
}
