//! Repository for the `projects` table.

use sitetrack_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{
    CreateProject, Project, ProjectListItem, ProjectWithCustomerRow, UpdateProject,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, customer_id, title, description, status, progress, start_date, \
                       estimated_end_date, actual_end_date, created_by, created_at, updated_at";

/// [`COLUMNS`] qualified for queries joining `customers c`.
const JOINED_COLUMNS: &str = "p.id, p.customer_id, p.title, p.description, p.status, p.progress, \
                              p.start_date, p.estimated_end_date, p.actual_end_date, \
                              p.created_by, p.created_at, p.updated_at, \
                              c.name AS customer_name, c.email AS customer_email";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// Missing status, progress and start date fall back to the column
    /// defaults (`Not Started`, 0, now).
    pub async fn create(
        pool: &PgPool,
        input: &CreateProject,
        created_by: DbId,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects
                (customer_id, title, description, status, progress, start_date,
                 estimated_end_date, created_by)
             VALUES ($1, $2, $3, COALESCE($4, 'Not Started'), COALESCE($5, 0),
                     COALESCE($6, NOW()), $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.customer_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.status)
            .bind(input.progress)
            .bind(input.start_date)
            .bind(input.estimated_end_date)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List projects newest first, each with its customer's name and email.
    ///
    /// `customer_id = None` lists every project.
    pub async fn list(
        pool: &PgPool,
        customer_id: Option<DbId>,
    ) -> Result<Vec<ProjectListItem>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS}
             FROM projects p
             JOIN customers c ON c.id = p.customer_id
             WHERE ($1::BIGINT IS NULL OR p.customer_id = $1)
             ORDER BY p.created_at DESC, p.id DESC"
        );
        let rows = sqlx::query_as::<_, ProjectWithCustomerRow>(&query)
            .bind(customer_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(ProjectListItem::from).collect())
    }

    /// List the projects of one customer, newest first.
    pub async fn list_by_customer(
        pool: &PgPool,
        customer_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects WHERE customer_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(customer_id)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                customer_id = COALESCE($4, customer_id),
                status = COALESCE($5, status),
                progress = COALESCE($6, progress),
                start_date = COALESCE($7, start_date),
                estimated_end_date = COALESCE($8, estimated_end_date),
                actual_end_date = COALESCE($9, actual_end_date)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.customer_id)
            .bind(input.status)
            .bind(input.progress)
            .bind(input.start_date)
            .bind(input.estimated_end_date)
            .bind(input.actual_end_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project with its updates and attachment rows.
    ///
    /// Returns the storage paths of the removed attachments so the caller can
    /// discard the files, or `None` if the project did not exist.
    ///
    /// The project row is locked before the paths are read, so an update
    /// being recorded concurrently is either committed and listed here or
    /// fails to find the project.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let paths: Vec<(String,)> = sqlx::query_as(
            "SELECT a.storage_path
             FROM update_attachments a
             JOIN project_updates u ON u.id = a.update_id
             WHERE u.project_id = $1
             ORDER BY a.id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(paths.into_iter().map(|(p,)| p).collect()))
    }
}
