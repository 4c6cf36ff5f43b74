use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A customer-role credential has no customer profile attached.
    ///
    /// This is a setup-integrity problem, kept separate from `NotFound` so
    /// clients can tell it apart from a missing project or update.
    #[error("No customer profile exists for credential {credential_id}")]
    ProfileMissing { credential_id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File exceeds the {limit_bytes} byte upload limit")]
    PayloadTooLarge { limit_bytes: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}
