//! Credential entity model and DTOs.

use serde::Serialize;
use sitetrack_core::roles::Role;
use sitetrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Full credential row from the `credentials` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`CredentialResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct Credential {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe credential representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct CredentialResponse {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: Timestamp,
}

impl From<&Credential> for CredentialResponse {
    fn from(c: &Credential) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            email: c.email.clone(),
            role: c.role,
            created_at: c.created_at,
        }
    }
}

/// DTO for inserting a credential. The password is already hashed.
#[derive(Debug)]
pub struct CreateCredential {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}
