//! Handlers for the `/customers` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitetrack_core::credentials::{generate_placeholder_password, validate_new_password};
use sitetrack_core::customer::{
    normalize_email, validate_email, validate_required_text, validate_square_feet,
};
use sitetrack_core::error::CoreError;
use sitetrack_core::types::DbId;
use sitetrack_db::models::customer::{CreateCustomer, Customer, CustomerDeletion, UpdateCustomer};
use sitetrack_db::repositories::{CredentialRepo, CustomerRepo};

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{AuthCaller, RequireAdmin};
use crate::state::AppState;

/// Request body for `POST /customers`.
///
/// When `password` is omitted a placeholder is generated and returned once
/// as `temporary_password`.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    #[serde(flatten)]
    pub profile: CreateCustomer,
    pub password: Option<String>,
}

/// Response body for `POST /customers`.
#[derive(Debug, Serialize)]
pub struct CreatedCustomer {
    #[serde(flatten)]
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

/// Request body for `POST /customers/{id}/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// POST /api/customers
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateCustomerRequest>,
) -> AppResult<(StatusCode, Json<CreatedCustomer>)> {
    let mut profile = input.profile;
    validate_profile(&mut profile)?;

    if CredentialRepo::find_by_email(&state.pool, &profile.email)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "A user with this email already exists".into(),
        )));
    }

    let (password, temporary_password) = match input.password {
        Some(password) => {
            validate_new_password(&password)?;
            (password, None)
        }
        None => {
            let generated = generate_placeholder_password();
            (generated.clone(), Some(generated))
        }
    };
    let password_hash = hash_password(&password)?;

    let customer =
        CustomerRepo::create_with_credential(&state.pool, &profile, &password_hash, admin.credential_id)
            .await?;

    tracing::info!(
        customer_id = customer.id,
        credential_id = customer.credential_id,
        created_by = admin.credential_id,
        "Customer created",
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedCustomer {
            customer,
            temporary_password,
        }),
    ))
}

/// GET /api/customers
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<Customer>>> {
    let customers = CustomerRepo::list(&state.pool).await?;
    Ok(Json(customers))
}

/// GET /api/customers/{id}
///
/// Admins may read any profile; customers only their own.
pub async fn get_by_id(
    State(state): State<AppState>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<DbId>,
) -> AppResult<Json<Customer>> {
    let customer = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;
    caller.require_owner_or_admin(customer.id)?;
    Ok(Json(customer))
}

/// PUT /api/customers/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateCustomer>,
) -> AppResult<Json<Customer>> {
    validate_patch(&mut input)?;

    let existing = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;

    if let Some(email) = &input.email {
        if let Some(other) = CredentialRepo::find_by_email(&state.pool, email).await? {
            if other.id != existing.credential_id {
                return Err(AppError::Core(CoreError::Conflict(
                    "A user with this email already exists".into(),
                )));
            }
        }
    }

    let customer = CustomerRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;

    tracing::info!(customer_id = id, updated_by = admin.credential_id, "Customer updated");
    Ok(Json(customer))
}

/// DELETE /api/customers/{id}
///
/// Refused with 409 while the customer still has projects. Removes the
/// profile and its credential together.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    match CustomerRepo::delete(&state.pool, id).await? {
        CustomerDeletion::Deleted => {
            tracing::info!(customer_id = id, deleted_by = admin.credential_id, "Customer deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        CustomerDeletion::NotFound => Err(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        })),
        CustomerDeletion::HasProjects(count) => Err(AppError::Core(CoreError::Conflict(format!(
            "Customer {id} still has {count} project(s); delete them first"
        )))),
    }
}

/// POST /api/customers/{id}/reset-password
///
/// Replace the password of the customer's credential. Returns 204 No Content.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    validate_new_password(&input.new_password)?;

    let customer = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Customer",
            id,
        }))?;

    let password_hash = hash_password(&input.new_password)?;
    CredentialRepo::update_password(&state.pool, customer.credential_id, &password_hash).await?;

    tracing::info!(customer_id = id, reset_by = admin.credential_id, "Customer password reset");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate a new profile in place, trimming text and normalizing the email.
fn validate_profile(profile: &mut CreateCustomer) -> Result<(), CoreError> {
    for (field, value) in [
        ("name", &mut profile.name),
        ("contact_number", &mut profile.contact_number),
        ("address", &mut profile.address),
        ("site_location", &mut profile.site_location),
    ] {
        validate_required_text(field, value)?;
        *value = value.trim().to_string();
    }
    profile.email = normalize_email(&profile.email);
    validate_email(&profile.email)?;
    validate_square_feet(profile.square_feet)
}

/// Validate only the fields present in a patch.
fn validate_patch(patch: &mut UpdateCustomer) -> Result<(), CoreError> {
    for (field, value) in [
        ("name", &mut patch.name),
        ("contact_number", &mut patch.contact_number),
        ("address", &mut patch.address),
        ("site_location", &mut patch.site_location),
    ] {
        if let Some(v) = value {
            validate_required_text(field, v)?;
            *v = v.trim().to_string();
        }
    }
    if let Some(email) = &mut patch.email {
        *email = normalize_email(email);
        validate_email(email)?;
    }
    if let Some(square_feet) = patch.square_feet {
        validate_square_feet(square_feet)?;
    }
    Ok(())
}
