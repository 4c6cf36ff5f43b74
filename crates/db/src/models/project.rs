//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sitetrack_core::project_status::ProjectStatus;
use sitetrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use crate::models::customer::{Customer, CustomerSummary};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub customer_id: DbId,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub progress: i32,
    pub start_date: Timestamp,
    pub estimated_end_date: Option<Timestamp>,
    pub actual_end_date: Option<Timestamp>,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A project joined with the name and email of its customer.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectWithCustomerRow {
    #[sqlx(flatten)]
    pub project: Project,
    pub customer_name: String,
    pub customer_email: String,
}

/// List item: project fields plus a customer summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectListItem {
    #[serde(flatten)]
    pub project: Project,
    pub customer: CustomerSummary,
}

impl From<ProjectWithCustomerRow> for ProjectListItem {
    fn from(row: ProjectWithCustomerRow) -> Self {
        let customer = CustomerSummary {
            id: row.project.customer_id,
            name: row.customer_name,
            email: row.customer_email,
        };
        Self {
            project: row.project,
            customer,
        }
    }
}

/// Detail view: project fields plus the full customer profile.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub customer: Customer,
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    #[serde(alias = "customer", alias = "customerId")]
    pub customer_id: DbId,
    /// Defaults to `Not Started` if omitted.
    pub status: Option<ProjectStatus>,
    /// Defaults to 0 if omitted.
    pub progress: Option<i32>,
    /// Defaults to now if omitted.
    pub start_date: Option<Timestamp>,
    pub estimated_end_date: Option<Timestamp>,
}

/// DTO for updating an existing project. All fields are optional.
///
/// Status and progress are taken as given; no consistency between them is
/// enforced on direct edits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "customer", alias = "customerId")]
    pub customer_id: Option<DbId>,
    pub status: Option<ProjectStatus>,
    pub progress: Option<i32>,
    pub start_date: Option<Timestamp>,
    pub estimated_end_date: Option<Timestamp>,
    pub actual_end_date: Option<Timestamp>,
}
