use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sitetrack_core::error::CoreError;

/// Error type returned by every handler and extractor.
///
/// Rendered as `{ "message": ..., "code": ... }` with the matching status.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed request framing (bad JSON, broken multipart).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub code: &'static str,
}

impl AppError {
    /// Status, machine-readable code and client-facing message.
    ///
    /// Internal details are logged here and never leave the server.
    pub fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Core(core) => core_parts(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, Json(ErrorBody { message, code })).into_response()
    }
}

fn internal(detail: &dyn std::fmt::Display) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn core_parts(err: &CoreError) -> (StatusCode, &'static str, String) {
    let (status, code) = match err {
        CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        CoreError::ProfileMissing { credential_id } => {
            tracing::warn!(credential_id, "Customer credential has no profile");
            return (
                StatusCode::NOT_FOUND,
                "PROFILE_NOT_FOUND",
                "Customer profile not found".to_string(),
            );
        }
        CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        CoreError::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE_TYPE"),
        CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        CoreError::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
        CoreError::Internal(msg) => return internal(msg),
    };
    (status, code, client_message(err))
}

/// The variant's payload without the `Display` prefix added by `CoreError`.
fn client_message(err: &CoreError) -> String {
    match err {
        CoreError::Validation(msg)
        | CoreError::UnsupportedFileType(msg)
        | CoreError::Conflict(msg)
        | CoreError::Unauthorized(msg)
        | CoreError::Forbidden(msg) => msg.clone(),
        CoreError::NotFound { entity, id } => format!("{entity} with id {id} not found"),
        other => other.to_string(),
    }
}

/// Map a sqlx error by Postgres SQLSTATE and constraint name.
///
/// | SQLSTATE | Constraint             | Result |
/// |----------|------------------------|--------|
/// | 23505    | `uq_credentials_email` | 409, duplicate email message |
/// | 23505    | other `uq_*`           | 409    |
/// | 23503    | any                    | 409, row still referenced |
/// | 23514    | any                    | 400    |
/// | other    |                        | 500    |
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => return internal(other),
    };

    let constraint = db_err.constraint().unwrap_or("unknown");
    match db_err.code().as_deref() {
        Some("23505") if constraint == "uq_credentials_email" => (
            StatusCode::CONFLICT,
            "CONFLICT",
            "A user with this email already exists".to_string(),
        ),
        Some("23505") if constraint.starts_with("uq_") => (
            StatusCode::CONFLICT,
            "CONFLICT",
            format!("Duplicate value violates unique constraint: {constraint}"),
        ),
        Some("23503") => {
            tracing::warn!(constraint, error = %db_err, "Foreign key violation");
            (
                StatusCode::CONFLICT,
                "CONFLICT",
                "The record is referenced by or refers to a missing record".to_string(),
            )
        }
        Some("23514") => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Value rejected by check constraint: {constraint}"),
        ),
        _ => internal(db_err),
    }
}
