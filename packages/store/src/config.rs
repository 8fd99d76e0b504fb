//! # Application configuration — `sightstick.toml`
//!
//! Defines the TOML file read at startup (filename:
//! [`AppConfig::filename`] = `"sightstick.toml"`). It selects the backend and
//! controls local session persistence.
//!
//! ## Structure
//!
//! ```toml
//! [backend]
//! kind = "firebase"            # "memory" (default) or "firebase"
//! api_key = "AIza..."          # optional, falls back to FIREBASE_API_KEY
//! project_id = "my-project"    # optional, falls back to FIREBASE_PROJECT_ID
//!
//! [session]
//! persist = true               # cache the signed-in profile locally
//! cache_key = "session_user"
//! ```
//!
//! All structs derive `Default` (with production defaults) so that a missing or
//! empty config file is equivalent to the default configuration. Browser
//! builds have no file to read and bake the Firebase keys in at compile time
//! instead (see [`AppConfig::with_firebase_keys`]).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::kv::SESSION_USER_KEY;

/// Top-level configuration stored in `sightstick.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Which identity/document service to talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Firebase,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Local session persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_persist")]
    pub persist: bool,
    #[serde(default = "default_cache_key")]
    pub cache_key: String,
}

fn default_persist() -> bool {
    true
}

fn default_cache_key() -> String {
    SESSION_USER_KEY.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            cache_key: default_cache_key(),
        }
    }
}

impl AppConfig {
    /// Builder method to pick the backend.
    pub fn with_backend(mut self, kind: BackendKind) -> Self {
        self.backend.kind = kind;
        self
    }

    /// Builder method to select Firebase with explicit project keys.
    pub fn with_firebase_keys(mut self, api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        self.backend.kind = BackendKind::Firebase;
        self.backend.api_key = Some(api_key.into());
        self.backend.project_id = Some(project_id.into());
        self
    }

    /// Builder method to turn local session persistence on or off.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.session.persist = persist;
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "sightstick.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read `<dir>/sightstick.toml`; a missing file yields the defaults.
    pub fn load_from(dir: &Path) -> Result<Self, StoreError> {
        match std::fs::read_to_string(dir.join(Self::filename())) {
            Ok(content) => Ok(Self::from_toml(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
