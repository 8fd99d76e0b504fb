//! Error types returned by backend adapters and the share-link builders.

use thiserror::Error;

/// Failure reported by a [`Backend`](crate::backend::Backend) call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Email/password pair rejected by the identity service.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Too many attempts; the identity service is throttling this client.
    #[error("Too many attempts, try again later")]
    RateLimited,

    /// An account already exists for this email.
    #[error("An account with this email already exists")]
    EmailInUse,

    /// The password does not meet the identity service's minimum.
    #[error("Password should be at least {min} characters")]
    WeakPassword { min: usize },

    /// Transport or service failure without a more specific mapping.
    #[error("Backend error: {0}")]
    Unknown(String),
}

impl BackendError {
    pub fn unknown(message: impl Into<String>) -> Self {
        BackendError::Unknown(message.into())
    }
}

impl From<store::StoreError> for BackendError {
    fn from(e: store::StoreError) -> Self {
        BackendError::Unknown(format!("Local storage: {e}"))
    }
}

/// Failure building a document-sharing link.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error("Recipient email is required")]
    MissingRecipient,

    #[error("Phone number must contain digits")]
    InvalidPhone,
}
