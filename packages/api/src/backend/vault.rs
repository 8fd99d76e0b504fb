//! The ambient session a backend keeps between runs.
//!
//! Backends built over a [`KeyValueStore`] write their open [`SessionHandle`]
//! under [`AMBIENT_SESSION_KEY`] whenever it changes, and read it back in
//! [`Backend::restore_session`](super::Backend::restore_session). Without a
//! store the vault remembers nothing.

use store::{KeyValueStore, SessionCache};

use super::SessionHandle;

/// Key under which a backend keeps its open session.
pub const AMBIENT_SESSION_KEY: &str = "ambient_session";

pub(crate) struct SessionVault<S> {
    slot: Option<SessionCache<S>>,
}

impl<S: KeyValueStore> SessionVault<S> {
    pub(crate) fn new(store: Option<S>) -> Self {
        Self {
            slot: store.map(|store| SessionCache::with_key(store, AMBIENT_SESSION_KEY)),
        }
    }

    /// The remembered session. An unreadable entry is dropped.
    pub(crate) async fn load(&self) -> Option<SessionHandle> {
        let slot = self.slot.as_ref()?;
        match slot.load::<SessionHandle>().await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("Discarding unreadable stored session: {}", e);
                self.remember(None).await;
                None
            }
        }
    }

    /// Store `handle`, or forget the stored session for `None`.
    pub(crate) async fn remember(&self, handle: Option<&SessionHandle>) {
        let Some(slot) = &self.slot else {
            return;
        };
        let result = match handle {
            Some(handle) => slot.save(handle).await,
            None => slot.clear().await,
        };
        if let Err(e) = result {
            tracing::warn!("Failed to store the ambient session: {}", e);
        }
    }
}
