//! Route definitions for the `/updates` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use sitetrack_core::attachment::{MAX_ATTACHMENT_BYTES, MAX_FILES_PER_UPDATE};

use crate::handlers::update;
use crate::state::AppState;

/// Request body ceiling for `POST /updates`: ten full-size files plus 1 MiB
/// for the text fields and multipart framing.
pub const UPLOAD_BODY_LIMIT: usize =
    MAX_FILES_PER_UPDATE * MAX_ATTACHMENT_BYTES as usize + 1024 * 1024;

/// Routes mounted at `/updates`.
///
/// ```text
/// POST   /                        -> create (multipart)
/// GET    /project/{project_id}    -> list_by_project
/// GET    /{id}                    -> get_by_id
/// DELETE /{id}                    -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(update::create).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/project/{project_id}", get(update::list_by_project))
        .route("/{id}", get(update::get_by_id).delete(update::delete))
}
