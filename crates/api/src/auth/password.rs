//! Argon2id hashing for credential passwords.
//!
//! Hashes are stored as PHC strings, so the salt and cost parameters travel
//! with each hash and older hashes keep verifying if the defaults change.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{AppError, AppResult};

fn hashing_error(e: password_hash::Error) -> AppError {
    AppError::InternalError(format!("Password hashing error: {e}"))
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(hashing_error)
}

/// Check a plaintext password against a stored hash.
///
/// A mismatch is `Ok(false)`; an unparseable stored hash is an internal error.
pub fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(hashing_error)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(hashing_error(e)),
    }
}
