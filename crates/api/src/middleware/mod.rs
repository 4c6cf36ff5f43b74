//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated credential from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`rbac::AuthCaller`] -- Any authenticated caller, with a customer's own
//!   profile resolved for ownership checks.

pub mod auth;
pub mod rbac;
