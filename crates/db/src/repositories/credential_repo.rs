//! Repository for the `credentials` table.

use sitetrack_core::roles::Role;
use sitetrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::credential::{CreateCredential, Credential};

const COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Provides lookup and write operations for login credentials.
pub struct CredentialRepo;

impl CredentialRepo {
    /// Insert a new credential, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCredential,
    ) -> Result<Credential, sqlx::Error> {
        let query = format!(
            "INSERT INTO credentials (name, email, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Credential>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.role)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Credential>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM credentials WHERE id = $1");
        sqlx::query_as::<_, Credential>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a credential by its (already normalized) email.
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Credential>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM credentials WHERE email = $1");
        sqlx::query_as::<_, Credential>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Whether any credential with the given role exists.
    pub async fn role_exists(pool: &PgPool, role: Role) -> Result<bool, sqlx::Error> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM credentials WHERE role = $1)")
                .bind(role)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }

    /// Replace a credential's password hash. Returns `true` if a row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE credentials SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
