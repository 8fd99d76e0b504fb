//! Credential helpers shared by the backends.

mod password;

pub use password::{check_strength, hash_password, verify_password, MIN_PASSWORD_LEN};

/// Canonical form of an email used as an account key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
