//! Access tokens.
//!
//! HS256 JWTs carrying the credential id and role. Nothing is stored server
//! side; a token stays valid until `exp`, even across a password change.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sitetrack_core::roles::Role;
use sitetrack_core::types::DbId;
use uuid::Uuid;

use crate::config::{env_or, env_required, ConfigError};

const DEFAULT_EXPIRY_HOURS: i64 = 24;

/// Token payload.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Credential id.
    pub sub: DbId,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
    /// Random per-token id.
    pub jti: String,
}

impl Claims {
    fn issue(credential_id: DbId, role: Role, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: credential_id,
            role,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret shared by signing and verification.
    pub secret: String,
    pub expiry_hours: i64,
}

impl JwtConfig {
    /// | Env Var            | Default  |
    /// |--------------------|----------|
    /// | `JWT_SECRET`       | required |
    /// | `JWT_EXPIRY_HOURS` | `24`     |
    pub fn from_env() -> Result<Self, ConfigError> {
        let expiry_hours = env_or("JWT_EXPIRY_HOURS", DEFAULT_EXPIRY_HOURS)?;
        if expiry_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRY_HOURS",
                value: expiry_hours.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(Self {
            secret: env_required("JWT_SECRET")?,
            expiry_hours,
        })
    }

    /// `sub` is numeric, so it is enforced by deserializing [`Claims`]
    /// rather than through the required-claims list, which only accepts a
    /// string `sub`.
    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

/// Sign a token for `credential_id` valid for `config.expiry_hours`.
pub fn generate_access_token(
    credential_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::issue(credential_id, role, Duration::hours(config.expiry_hours));
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature and expiry and decode the claims.
///
/// Tokens whose `role` is not a known [`Role`] fail to decode.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &JwtConfig::validation(),
    )
    .map(|data| data.claims)
}
