//! Shared session constructor for all platforms.
//!
//! Picks the pieces a [`SessionMachine`] runs on:
//! - **Web** (WASM + `web` feature): session cache in `localStorage` via [`store::LocalStorageStore`]
//! - **Desktop / Mobile** (native): session cache under `<data_dir>/sightstick/` via [`store::FileStore`]
//!
//! The same store keeps the backend's open session (and, for the in-memory
//! backend, its accounts) so a restarted app signs back in.
//!
//! Native builds read the backend from `sightstick.toml` ([`store::AppConfig`]).
//! Browser builds cannot read files and use the `FIREBASE_API_KEY` /
//! `FIREBASE_PROJECT_ID` values present when they were compiled. A Firebase
//! configuration that cannot be used falls back to the in-memory backend.

use std::path::PathBuf;

use api::{AppBackend, MemoryBackend};
use store::{AppConfig, BackendKind, KeyValueStore, SessionCache};

use crate::session::SessionMachine;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub type PlatformStore = store::LocalStorageStore;
#[cfg(not(all(target_arch = "wasm32", feature = "web")))]
pub type PlatformStore = store::FileStore;

/// The session machine the apps run.
pub type AppSession = SessionMachine<AppBackend<PlatformStore>, PlatformStore>;

/// Per-platform directory for the config file and the session cache.
pub fn data_dir() -> PathBuf {
    #[cfg(not(target_arch = "wasm32"))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sightstick")
    }
    #[cfg(target_arch = "wasm32")]
    {
        PathBuf::from("sightstick")
    }
}

/// Read the app configuration; any problem yields the defaults.
pub fn load_config() -> AppConfig {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match AppConfig::load_from(&data_dir()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", AppConfig::filename(), e);
                AppConfig::default()
            }
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        build_config(option_env!("FIREBASE_API_KEY"), option_env!("FIREBASE_PROJECT_ID"))
    }
}

/// Configuration from keys fixed at build time. Both keys select Firebase;
/// anything less keeps the in-memory backend.
pub fn build_config(api_key: Option<&str>, project_id: Option<&str>) -> AppConfig {
    match (api_key.map(str::trim), project_id.map(str::trim)) {
        (Some(api_key), Some(project_id)) if !api_key.is_empty() && !project_id.is_empty() => {
            AppConfig::default().with_firebase_keys(api_key, project_id)
        }
        _ => AppConfig::default(),
    }
}

pub fn make_store() -> PlatformStore {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        store::LocalStorageStore::new()
    }
    #[cfg(not(all(target_arch = "wasm32", feature = "web")))]
    {
        store::FileStore::new(data_dir())
    }
}

/// Backend for `config`, keeping its state in `store` when one is given.
pub fn make_backend<S: KeyValueStore + Clone>(config: &AppConfig, store: Option<S>) -> AppBackend<S> {
    match config.backend.kind {
        BackendKind::Memory => AppBackend::Memory(MemoryBackend::with_store(store)),
        BackendKind::Firebase => match firebase_backend(config, store.clone()) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!("Firebase backend unavailable ({}), using the in-memory backend", e);
                AppBackend::Memory(MemoryBackend::with_store(store))
            }
        },
    }
}

#[cfg(feature = "firebase")]
fn firebase_backend<S: KeyValueStore>(config: &AppConfig, store: Option<S>) -> Result<AppBackend<S>, String> {
    let firebase = match (&config.backend.api_key, &config.backend.project_id) {
        (Some(api_key), Some(project_id)) => api::FirebaseConfig::new(api_key.clone(), project_id.clone()),
        _ => api::FirebaseConfig::from_env()?,
    };
    Ok(AppBackend::Firebase(api::FirebaseBackend::with_store(firebase, store)))
}

#[cfg(not(feature = "firebase"))]
fn firebase_backend<S>(_config: &AppConfig, _store: Option<S>) -> Result<AppBackend<S>, String> {
    Err("built without the `firebase` feature".to_string())
}

/// Create a session machine over `store`.
///
/// With persistence turned off nothing is written to `store`.
pub fn make_session_with<S: KeyValueStore + Clone>(config: &AppConfig, store: S) -> SessionMachine<AppBackend<S>, S> {
    let persist = config.session.persist;
    let backend = make_backend(config, persist.then(|| store.clone()));
    tracing::info!("Using the {} backend", backend.name());
    let cache = persist.then(|| SessionCache::with_key(store, config.session.cache_key.clone()));
    SessionMachine::from_parts(backend, cache)
}

/// Create the session machine for this platform.
pub fn make_session(config: &AppConfig) -> AppSession {
    make_session_with(config, make_store())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{Mode, ProfileDraft};
    use store::{FileStore, MemoryStore};

    #[test]
    fn test_default_config_uses_memory_backend() {
        let backend = make_backend(&AppConfig::default(), None::<MemoryStore>);
        assert_eq!(backend.name(), "memory");
    }

    #[test]
    fn test_build_config_needs_both_keys() {
        assert_eq!(build_config(None, None), AppConfig::default());
        assert_eq!(build_config(Some("KEY"), None), AppConfig::default());
        assert_eq!(build_config(Some(" "), Some("project")), AppConfig::default());

        let config = build_config(Some("KEY"), Some("sight-to-sense"));
        assert_eq!(config.backend.kind, BackendKind::Firebase);
        assert_eq!(config.backend.api_key.as_deref(), Some("KEY"));
    }

    #[cfg(feature = "firebase")]
    #[test]
    fn test_build_keys_select_firebase() {
        let config = build_config(Some("KEY"), Some("sight-to-sense"));
        assert_eq!(make_backend(&config, None::<MemoryStore>).name(), "firebase");
    }

    #[cfg(not(feature = "firebase"))]
    #[test]
    fn test_firebase_without_feature_falls_back() {
        let config = build_config(Some("KEY"), Some("sight-to-sense"));
        assert_eq!(make_backend(&config, None::<MemoryStore>).name(), "memory");
    }

    #[tokio::test]
    async fn test_session_without_persistence() {
        let store = MemoryStore::new();
        let session = make_session_with(&AppConfig::default().with_persist(false), store.clone());
        assert!(session.snapshot().is_loading());

        session.select_mode(Mode::Personal).unwrap();
        session
            .register(ProfileDraft::new("ada@example.com"), "secret1")
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_file_backed_session_survives_restart() {
        let dir = std::env::temp_dir().join(format!("sightstick_restart_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config = AppConfig::default();

        let user = {
            let session = make_session_with(&config, FileStore::new(dir.clone()));
            session.select_mode(Mode::Personal).unwrap();
            let draft = ProfileDraft {
                name: "Ravi".to_string(),
                stick_sim: Some("SIM123456".to_string()),
                ..ProfileDraft::new("ravi@example.com")
            };
            session.register(draft, "secret1").await.unwrap()
        };

        let session = make_session_with(&config, FileStore::new(dir.clone()));
        let mut observer = session.resume().await;
        assert!(observer.process_pending().await);

        let snapshot = session.snapshot();
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.user, Some(user.clone()));
        let cached: Option<api::UserProfile> = SessionCache::new(FileStore::new(dir.clone())).load().await.unwrap();
        assert_eq!(cached, Some(user));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
