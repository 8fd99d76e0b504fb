//! This crate contains the session logic and shared UI for the workspace.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`session`] | The session state machine and its ambient-change observer |
//! | [`guard`] | Route policies and guard decisions |
//! | [`forms`] | Form input to domain values |
//! | [`platform`] | Per-platform construction of backend, cache and session |
//! | `auth` | Dioxus context provider and hooks |

pub mod error;
pub mod forms;
pub mod guard;
pub mod platform;
pub mod session;

mod auth;
pub use auth::{use_session, use_session_machine, AuthProvider, LogoutButton};

pub use error::AuthError;
pub use guard::{evaluate, requires_auth, requires_ngo_mode, Destination, GuardDecision, Policy};
pub use platform::{make_session, AppSession};
pub use session::{Operation, Session, SessionMachine, SessionObserver, SessionStatus};
