//! # Password hashing and verification — Argon2id
//!
//! Used by the in-memory backend to hold credentials the way a real identity
//! service would:
//!
//! - [`hash_password`] — generates a random salt via [`OsRng`], hashes the plaintext
//!   password with the default Argon2id parameters, and returns the result as a
//!   PHC-format string (e.g. `$argon2id$v=19$m=19456,t=2,p=1$...`).
//!
//! - [`verify_password`] — parses a PHC-format hash and checks whether the provided
//!   plaintext matches. Returns `Ok(true)` on success, `Ok(false)` on mismatch, or
//!   `Err` if the stored hash is malformed.
//!
//! - [`check_strength`] — the identity service's minimum length rule.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::BackendError;

/// Shortest password the identity services accept.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password using Argon2id. Returns a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, BackendError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| BackendError::unknown(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, BackendError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| BackendError::unknown(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Reject passwords shorter than [`MIN_PASSWORD_LEN`] characters.
pub fn check_strength(password: &str) -> Result<(), BackendError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BackendError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}
