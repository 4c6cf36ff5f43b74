//! Bearer-token authentication.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sitetrack_core::error::CoreError;
use sitetrack_core::roles::Role;
use sitetrack_core::types::DbId;

use crate::auth::jwt::{validate_token, JwtConfig};
use crate::error::AppError;
use crate::state::AppState;

/// The credential behind a valid access token.
///
/// Taking `AuthUser` as a handler argument makes the route require a token.
/// The decoded value is cached in the request extensions, so stacking it
/// with [`RequireAdmin`](super::rbac::RequireAdmin) or
/// [`AuthCaller`](super::rbac::AuthCaller) verifies the token once.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub credential_id: DbId,
    pub role: Role,
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}

/// The token part of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| unauthorized("Authorization header is not valid text"))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(unauthorized("Expected 'Authorization: Bearer <token>'")),
    }
}

impl AuthUser {
    /// Authenticate from raw request headers.
    ///
    /// Used directly where authentication is conditional, such as admin
    /// registration once the first admin exists.
    pub fn from_headers(headers: &HeaderMap, jwt: &JwtConfig) -> Result<Self, AppError> {
        let token = bearer_token(headers)?;
        let claims = validate_token(token, jwt).map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            unauthorized("Invalid or expired token")
        })?;

        Ok(AuthUser {
            credential_id: claims.sub,
            role: claims.role,
        })
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let user = Self::from_headers(&parts.headers, &state.config.jwt)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
