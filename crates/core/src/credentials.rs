//! Password rules and placeholder passwords for customer credentials.

use rand::Rng;

use crate::error::CoreError;

/// Length of a generated placeholder password.
pub const PLACEHOLDER_PASSWORD_LENGTH: usize = 16;

/// Minimum length of a password chosen by a person.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Upper bound that keeps hashing cost predictable.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Check a password supplied at registration, creation, change or reset.
pub fn validate_new_password(password: &str) -> Result<(), CoreError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters long"
        )));
    }
    if password.trim().is_empty() {
        return Err(CoreError::Validation("Password must not be blank".into()));
    }
    Ok(())
}

/// Generate a random alphanumeric password for a newly created customer.
///
/// The plaintext is returned to the creating admin once and must be replaced
/// through a password change or reset.
pub fn generate_placeholder_password() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(PLACEHOLDER_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}
