pub mod auth;
pub mod customer;
pub mod health;
pub mod project;
pub mod update;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                        create admin (open until one exists)
/// /auth/admin-login                     login (public)
/// /auth/customer-login                  login (public)
/// /auth/me                              current credential (requires auth)
/// /auth/password                        change own password (requires auth)
///
/// /customers                            list, create (admin only)
/// /customers/{id}                       get (owner or admin), update, delete
/// /customers/{id}/reset-password        reset password (admin only)
///
/// /projects                             list (scoped), create (admin only)
/// /projects/customer/{customer_id}      list by customer (owner or admin)
/// /projects/{id}                        get (owner or admin), update, delete
///
/// /updates                              create, multipart (admin only)
/// /updates/project/{project_id}         list by project (owner or admin)
/// /updates/{id}                         get (owner or admin), delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/customers", customer::router())
        .nest("/projects", project::router())
        .nest("/updates", update::router())
}
