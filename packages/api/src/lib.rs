//! # API crate — domain models and the backend boundary
//!
//! Everything the session layer needs to know about users and the identity /
//! document service lives here. Frontends depend on this crate through `ui`.
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`models`] | — | `Mode`, `UserProfile`, registration drafts, partial patches, NGO members |
//! | [`backend`] | — | The [`Backend`] adapter trait, session observers, the in-memory backend, and the Firebase backend (`firebase`); both can keep their open session in a `store::KeyValueStore` |
//! | [`auth`] | — | Argon2id password hashing and credential normalisation for the in-memory backend |
//! | [`share`] | — | Email and WhatsApp document-sharing links |
//! | [`error`] | — | [`BackendError`] and [`ShareError`] |

pub mod auth;
pub mod backend;
pub mod error;
pub mod models;
pub mod share;

pub use backend::{AppBackend, Backend, MemoryBackend, SessionHandle, Subscription};
#[cfg(feature = "firebase")]
pub use backend::{FirebaseBackend, FirebaseConfig};
pub use error::{BackendError, ShareError};
pub use models::{filter_members, Member, MemberDraft, MemberStatus, Mode, ProfileDraft, ProfilePatch, UserProfile};
