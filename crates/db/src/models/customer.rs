//! Customer profile model and DTOs.

use serde::{Deserialize, Serialize};
use sitetrack_core::customer::BuildingType;
use sitetrack_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `customers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub credential_id: DbId,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub square_feet: i32,
    pub site_location: String,
    pub building_type: BuildingType,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The customer fields embedded in project list items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

/// DTO for creating a customer profile together with its credential.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub square_feet: i32,
    pub site_location: String,
    pub building_type: BuildingType,
}

/// DTO for updating a customer profile. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub square_feet: Option<i32>,
    pub site_location: Option<String>,
    pub building_type: Option<BuildingType>,
}

/// Result of a customer delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerDeletion {
    Deleted,
    NotFound,
    /// The customer still owns this many projects; nothing was removed.
    HasProjects(i64),
}
