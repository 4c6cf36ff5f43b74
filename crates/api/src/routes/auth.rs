//! Route definitions for the `/auth` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register        -> register
/// POST /admin-login     -> admin_login
/// POST /customer-login  -> customer_login
/// GET  /me              -> me
/// PUT  /password        -> change_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/admin-login", post(auth::admin_login))
        .route("/customer-login", post(auth::customer_login))
        .route("/me", get(auth::me))
        .route("/password", put(auth::change_password))
}
