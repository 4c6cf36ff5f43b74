//! Repository for the `project_updates` and `update_attachments` tables.

use std::collections::HashMap;

use chrono::Utc;
use sitetrack_core::project_status::{apply_progress, ProjectStatus};
use sitetrack_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::project::Project;
use crate::models::update::{
    Attachment, CreateProgressUpdate, ProgressUpdate, RecordedUpdate, UpdateWithFiles,
};

const COLUMNS: &str = "id, project_id, title, description, progress, created_by, created_at";

const ATTACHMENT_COLUMNS: &str = "id, update_id, position, kind, storage_path, original_name, \
                                  mime_type, size_bytes, created_at";

const PROJECT_COLUMNS: &str = "id, customer_id, title, description, status, progress, start_date, \
                               estimated_end_date, actual_end_date, created_by, created_at, \
                               updated_at";

/// Provides operations for progress updates and their attachments.
pub struct UpdateRepo;

impl UpdateRepo {
    /// Record an update and apply its progress to the parent project.
    ///
    /// The project row is locked, the update and its attachment rows are
    /// inserted and the project's progress, status and end date are
    /// rewritten, all in one transaction. Returns `None` (and writes
    /// nothing) if the project does not exist.
    pub async fn create_with_progress(
        pool: &PgPool,
        input: &CreateProgressUpdate,
        created_by: DbId,
    ) -> Result<Option<RecordedUpdate>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<(ProjectStatus, Option<Timestamp>)> = sqlx::query_as(
            "SELECT status, actual_end_date FROM projects WHERE id = $1 FOR UPDATE",
        )
        .bind(input.project_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((status, actual_end_date)) = current else {
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO project_updates (project_id, title, description, progress, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let update = sqlx::query_as::<_, ProgressUpdate>(&query)
            .bind(input.project_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.progress)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO update_attachments
                (update_id, position, kind, storage_path, original_name, mime_type, size_bytes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ATTACHMENT_COLUMNS}"
        );
        let mut files = Vec::with_capacity(input.files.len());
        for (position, file) in input.files.iter().enumerate() {
            let attachment = sqlx::query_as::<_, Attachment>(&query)
                .bind(update.id)
                .bind(position as i32)
                .bind(file.kind)
                .bind(&file.storage_path)
                .bind(&file.original_name)
                .bind(&file.mime_type)
                .bind(file.size_bytes)
                .fetch_one(&mut *tx)
                .await?;
            files.push(attachment);
        }

        let outcome = apply_progress(status, actual_end_date, input.progress, Utc::now());
        let query = format!(
            "UPDATE projects SET progress = $2, status = $3, actual_end_date = $4
             WHERE id = $1
             RETURNING {PROJECT_COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(input.project_id)
            .bind(outcome.progress)
            .bind(outcome.status)
            .bind(outcome.actual_end_date)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(RecordedUpdate {
            update: UpdateWithFiles { update, files },
            project,
        }))
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UpdateWithFiles>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_updates WHERE id = $1");
        let update = sqlx::query_as::<_, ProgressUpdate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        let Some(update) = update else {
            return Ok(None);
        };

        let files = Self::attachments_for(pool, &[update.id])
            .await?
            .remove(&update.id)
            .unwrap_or_default();
        Ok(Some(UpdateWithFiles { update, files }))
    }

    /// List a project's updates newest first, each with its attachments.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<UpdateWithFiles>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_updates WHERE project_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        let updates = sqlx::query_as::<_, ProgressUpdate>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await?;

        let ids: Vec<DbId> = updates.iter().map(|u| u.id).collect();
        let mut by_update = Self::attachments_for(pool, &ids).await?;

        Ok(updates
            .into_iter()
            .map(|update| {
                let files = by_update.remove(&update.id).unwrap_or_default();
                UpdateWithFiles { update, files }
            })
            .collect())
    }

    /// Delete an update. Attachment rows go with it (`ON DELETE CASCADE`).
    ///
    /// The parent project's progress and status are left as they are.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_updates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attachments of the given updates, grouped by update id in upload order.
    async fn attachments_for(
        pool: &PgPool,
        update_ids: &[DbId],
    ) -> Result<HashMap<DbId, Vec<Attachment>>, sqlx::Error> {
        if update_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM update_attachments
             WHERE update_id = ANY($1)
             ORDER BY update_id, position"
        );
        let rows = sqlx::query_as::<_, Attachment>(&query)
            .bind(update_ids)
            .fetch_all(pool)
            .await?;

        let mut grouped: HashMap<DbId, Vec<Attachment>> = HashMap::new();
        for row in rows {
            grouped.entry(row.update_id).or_default().push(row);
        }
        Ok(grouped)
    }
}
