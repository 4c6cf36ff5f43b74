//! Progress update and attachment models.

use serde::Serialize;
use sitetrack_core::attachment::AttachmentKind;
use sitetrack_core::storage::StoredAttachment;
use sitetrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::models::project::Project;

/// A row from the `project_updates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgressUpdate {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub progress: i32,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// A row from the `update_attachments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing)]
    pub id: DbId,
    #[serde(skip_serializing)]
    pub update_id: DbId,
    #[serde(skip_serializing)]
    pub position: i32,
    pub kind: AttachmentKind,
    pub storage_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing)]
    pub created_at: Timestamp,
}

/// An update with its attachments in upload order.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateWithFiles {
    #[serde(flatten)]
    pub update: ProgressUpdate,
    pub files: Vec<Attachment>,
}

/// Input for recording an update. Files are already on disk.
#[derive(Debug, Clone)]
pub struct CreateProgressUpdate {
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub progress: i32,
    pub files: Vec<StoredAttachment>,
}

/// The recorded update and the project state it produced.
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    pub update: UpdateWithFiles,
    pub project: Project,
}
