//! Route definitions for the `/customers` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::customer;
use crate::state::AppState;

/// Routes mounted at `/customers`.
///
/// ```text
/// GET    /                      -> list
/// POST   /                      -> create
/// GET    /{id}                  -> get_by_id
/// PUT    /{id}                  -> update
/// DELETE /{id}                  -> delete
/// POST   /{id}/reset-password   -> reset_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(customer::list).post(customer::create))
        .route(
            "/{id}",
            get(customer::get_by_id)
                .put(customer::update)
                .delete(customer::delete),
        )
        .route("/{id}/reset-password", post(customer::reset_password))
}
