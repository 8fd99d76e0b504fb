use api::{BackendError, Mode};
use thiserror::Error;

/// Errors surfaced by session operations to the screens.
///
/// Every variant renders as a message fit for the user; screens show
/// `to_string()` as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many attempts. Please try again later")]
    RateLimited,

    #[error("This account is registered in {} mode, not {} mode", .actual.label(), .expected.label())]
    ModeMismatch { expected: Mode, actual: Mode },

    #[error("No profile was found for this account")]
    ProfileNotFound,

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("Password should be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Profile update failed: {0}")]
    UpdateFailed(String),

    #[error("No user logged in")]
    NoActiveSession,

    #[error("Already signed in")]
    AlreadyAuthenticated,

    #[error("Another session operation is still in progress")]
    SessionBusy,

    #[error("Something went wrong: {0}")]
    Unknown(String),
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }

    /// Map an `authenticate` failure.
    pub(crate) fn from_login(error: BackendError) -> Self {
        match error {
            BackendError::InvalidCredentials => AuthError::InvalidCredentials,
            BackendError::RateLimited => AuthError::RateLimited,
            other => AuthError::Unknown(other.to_string()),
        }
    }

    /// Map a `create_account` failure.
    pub(crate) fn from_registration(error: BackendError) -> Self {
        match error {
            BackendError::EmailInUse => AuthError::EmailInUse,
            BackendError::WeakPassword { min } => AuthError::WeakPassword { min },
            BackendError::RateLimited => AuthError::RateLimited,
            other => AuthError::RegistrationFailed(other.to_string()),
        }
    }
}
