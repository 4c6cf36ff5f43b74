//! Role- and ownership-based access control extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests before the handler
//! body runs. Admin-only routes take [`RequireAdmin`]; routes a customer may
//! read take [`AuthCaller`] and call
//! [`Caller::require_owner_or_admin`](sitetrack_core::access::Caller::require_owner_or_admin)
//! once the owning customer is known.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sitetrack_core::access::{require_role, Caller};
use sitetrack_core::roles::Role;
use sitetrack_db::repositories::CustomerRepo;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated admin. Customer tokens get 403.
#[derive(Debug)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if let Err(e) = require_role(user.role, Role::Admin) {
            tracing::debug!(
                credential_id = user.credential_id,
                path = %parts.uri.path(),
                "Admin route refused",
            );
            return Err(e.into());
        }
        Ok(RequireAdmin(user))
    }
}

/// Any authenticated caller, resolved to a [`Caller`].
///
/// For customer-role tokens the caller's own profile is looked up; a
/// credential without a profile is rejected with 404 `PROFILE_NOT_FOUND`.
#[derive(Debug)]
pub struct AuthCaller(pub Caller);

impl FromRequestParts<AppState> for AuthCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let profile_id = match user.role {
            Role::Admin => None,
            Role::Customer => {
                CustomerRepo::find_id_by_credential_id(&state.pool, user.credential_id).await?
            }
        };
        let caller = Caller::resolve(user.credential_id, user.role, profile_id)?;
        Ok(AuthCaller(caller))
    }
}
