//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sitetrack_core::customer::validate_required_text;
use sitetrack_core::error::CoreError;
use sitetrack_core::project_status::validate_progress;
use sitetrack_core::types::DbId;
use sitetrack_db::models::project::{
    CreateProject, Project, ProjectDetail, ProjectListItem, UpdateProject,
};
use sitetrack_db::repositories::{CustomerRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{AuthCaller, RequireAdmin};
use crate::state::AppState;

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(mut input): Json<CreateProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    validate_required_text("title", &input.title)?;
    input.title = input.title.trim().to_string();
    require_description(&input.description)?;
    if let Some(progress) = input.progress {
        validate_progress(progress)?;
    }
    ensure_customer_exists(&state, input.customer_id).await?;

    let project = ProjectRepo::create(&state.pool, &input, admin.credential_id).await?;

    tracing::info!(
        project_id = project.id,
        customer_id = project.customer_id,
        created_by = admin.credential_id,
        "Project created",
    );
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects
///
/// Admins see every project; customers see only their own.
pub async fn list(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
) -> AppResult<Json<Vec<ProjectListItem>>> {
    let projects = ProjectRepo::list(&state.pool, caller.customer_id()).await?;
    Ok(Json(projects))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProjectDetail>> {
    let project = ProjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    caller.require_owner_or_admin(project.customer_id)?;

    let customer = CustomerRepo::find_by_id(&state.pool, project.customer_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id: project.customer_id,
        }))?;

    Ok(Json(ProjectDetail { project, customer }))
}

/// GET /api/projects/customer/{customer_id}
pub async fn list_by_customer(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Path(customer_id): Path<DbId>,
) -> AppResult<Json<Vec<Project>>> {
    caller.require_owner_or_admin(customer_id)?;
    ensure_customer_exists(&state, customer_id).await?;

    let projects = ProjectRepo::list_by_customer(&state.pool, customer_id).await?;
    Ok(Json(projects))
}

/// PUT /api/projects/{id}
///
/// Fields are applied as given; status and progress are not reconciled.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateProject>,
) -> AppResult<Json<Project>> {
    if let Some(title) = &mut input.title {
        validate_required_text("title", title)?;
        *title = title.trim().to_string();
    }
    if let Some(description) = &input.description {
        require_description(description)?;
    }
    if let Some(progress) = input.progress {
        validate_progress(progress)?;
    }
    if let Some(customer_id) = input.customer_id {
        ensure_customer_exists(&state, customer_id).await?;
    }

    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    tracing::info!(project_id = id, updated_by = admin.credential_id, "Project updated");
    Ok(Json(project))
}

/// DELETE /api/projects/{id}
///
/// Removes the project with its updates, then discards their attachment files.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let paths = ProjectRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    state.attachments.discard_all(&paths).await;

    tracing::info!(
        project_id = id,
        deleted_by = admin.credential_id,
        files = paths.len(),
        "Project deleted",
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_customer_exists(state: &AppState, customer_id: DbId) -> AppResult<()> {
    CustomerRepo::find_by_id(&state.pool, customer_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id: customer_id,
        }))?;
    Ok(())
}

fn require_description(description: &str) -> Result<(), CoreError> {
    if description.trim().is_empty() {
        return Err(CoreError::Validation("description is required".into()));
    }
    Ok(())
}
