pub mod config;
pub mod error;
pub mod kv;

mod file_store;
mod memory;
pub use file_store::FileStore;
pub use memory::MemoryStore;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local_storage::LocalStorageStore;

pub use config::{AppConfig, BackendConfig, BackendKind, SessionConfig};
pub use error::StoreError;
pub use kv::{KeyValueStore, SessionCache, SESSION_USER_KEY};
