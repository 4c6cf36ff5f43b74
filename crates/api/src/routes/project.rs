//! Route definitions for the `/projects` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                         -> list
/// POST   /                         -> create
/// GET    /customer/{customer_id}   -> list_by_customer
/// GET    /{id}                     -> get_by_id
/// PUT    /{id}                     -> update
/// DELETE /{id}                     -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/customer/{customer_id}", get(project::list_by_customer))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
}
