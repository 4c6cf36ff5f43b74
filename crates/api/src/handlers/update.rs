//! Handlers for the `/updates` resource.
//!
//! `POST /updates` is a multipart form. Text fields:
//!
//! | Field                               | Required |
//! |-------------------------------------|----------|
//! | `project` (`projectId`, `project_id`) | yes    |
//! | `title`                             | yes      |
//! | `description`                       | yes      |
//! | `progress` (0-100)                  | yes      |
//!
//! plus up to ten `files` parts. Each file is checked against the allow-list
//! before any byte is written and streamed to disk under the per-file limit.
//! Until the update is committed the files belong to an [`UploadBatch`], so a
//! failed, timed out or abandoned request discards every file it wrote.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use sitetrack_core::attachment::MAX_FILES_PER_UPDATE;
use sitetrack_core::customer::validate_required_text;
use sitetrack_core::error::CoreError;
use sitetrack_core::project_status::validate_progress;
use sitetrack_core::storage::{AttachmentStore, StoredAttachment, UploadBatch};
use sitetrack_core::types::DbId;
use sitetrack_db::models::update::{CreateProgressUpdate, UpdateWithFiles};
use sitetrack_db::repositories::{ProjectRepo, UpdateRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{AuthCaller, RequireAdmin};
use crate::state::AppState;

/// Text fields collected from the multipart form.
#[derive(Debug, Default)]
struct UpdateForm {
    project: Option<String>,
    title: Option<String>,
    description: Option<String>,
    progress: Option<String>,
}

/// POST /api/updates
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<UpdateWithFiles>)> {
    let mut batch = state.attachments.batch();
    let update = match record_update(&state, admin.credential_id, multipart, &mut batch).await {
        Ok(update) => {
            batch.commit();
            update
        }
        Err(e) => {
            if !batch.is_empty() {
                tracing::debug!(files = batch.len(), "Discarding uploads of failed update");
            }
            batch.discard().await;
            return Err(e);
        }
    };

    tracing::info!(
        update_id = update.update.id,
        project_id = update.update.project_id,
        progress = update.update.progress,
        files = update.files.len(),
        created_by = admin.credential_id,
        "Update recorded",
    );
    Ok((StatusCode::CREATED, Json(update)))
}

/// GET /api/updates/project/{project_id}
pub async fn list_by_project(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<Vec<UpdateWithFiles>>> {
    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    caller.require_owner_or_admin(project.customer_id)?;

    let updates = UpdateRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(updates))
}

/// GET /api/updates/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<DbId>,
) -> AppResult<Json<UpdateWithFiles>> {
    let update = UpdateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Update",
            id,
        }))?;

    let project_id = update.update.project_id;
    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    caller.require_owner_or_admin(project.customer_id)?;

    Ok(Json(update))
}

/// DELETE /api/updates/{id}
///
/// Discards the attachment files (missing files are skipped), then removes
/// the record. The project's progress and status are not recomputed.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Update",
            id,
        })
    };

    let update = UpdateRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;

    let paths: Vec<String> = update.files.iter().map(|f| f.storage_path.clone()).collect();
    state.attachments.discard_all(&paths).await;

    if !UpdateRepo::delete(&state.pool, id).await? {
        return Err(not_found());
    }

    tracing::info!(
        update_id = id,
        project_id = update.update.project_id,
        deleted_by = admin.credential_id,
        "Update deleted",
    );
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read the form, store its files and record the update.
///
/// Every file written joins `batch` as soon as it is complete; the caller
/// commits the batch only after this returns `Ok`.
async fn record_update(
    state: &AppState,
    created_by: DbId,
    mut multipart: Multipart,
    batch: &mut UploadBatch,
) -> AppResult<UpdateWithFiles> {
    let mut form = UpdateForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" => {
                if batch.len() >= MAX_FILES_PER_UPDATE {
                    return Err(AppError::Core(CoreError::Validation(format!(
                        "At most {MAX_FILES_PER_UPDATE} files may be attached to an update"
                    ))));
                }
                batch.push(store_file(&state.attachments, field).await?);
            }
            "project" | "projectId" | "project_id" => {
                form.project = Some(field.text().await.map_err(multipart_error)?);
            }
            "title" => form.title = Some(field.text().await.map_err(multipart_error)?),
            "description" => {
                form.description = Some(field.text().await.map_err(multipart_error)?);
            }
            "progress" => form.progress = Some(field.text().await.map_err(multipart_error)?),
            _ => {} // ignore unknown fields
        }
    }

    let input = CreateProgressUpdate {
        project_id: parse_required(form.project.as_deref(), "project")?,
        title: required_text(form.title, "title")?,
        description: required_text(form.description, "description")?,
        progress: parse_required(form.progress.as_deref(), "progress")?,
        files: batch.files().to_vec(),
    };
    validate_required_text("title", &input.title)?;
    validate_progress(input.progress)?;

    let recorded = UpdateRepo::create_with_progress(&state.pool, &input, created_by)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: input.project_id,
        }))?;

    tracing::debug!(
        project_id = recorded.project.id,
        status = %recorded.project.status,
        progress = recorded.project.progress,
        "Project progress applied",
    );
    Ok(recorded.update)
}

/// Stream one file part to disk.
async fn store_file(store: &AttachmentStore, mut field: Field<'_>) -> AppResult<StoredAttachment> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Each 'files' part must carry a file name".into(),
            ))
        })?;
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut pending = store.begin(&file_name, &mime_type).await?;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = pending.write_chunk(&chunk).await {
                    pending.abort().await;
                    return Err(e.into());
                }
            }
            Ok(None) => break,
            Err(e) => {
                pending.abort().await;
                return Err(multipart_error(e));
            }
        }
    }
    Ok(pending.finish().await?)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::Core(CoreError::PayloadTooLarge {
            limit_bytes: crate::routes::update::UPLOAD_BODY_LIMIT as u64,
        });
    }
    AppError::BadRequest(err.body_text())
}

fn required_text(value: Option<String>, field: &str) -> Result<String, CoreError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

fn parse_required<T: std::str::FromStr>(value: Option<&str>, field: &str) -> Result<T, CoreError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("{field} is required")))?;
    raw.parse()
        .map_err(|_| CoreError::Validation(format!("{field} must be an integer, got '{raw}'")))
}
