//! Handlers for the `/auth` resource (register, logins, profile, password).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use sitetrack_core::access::require_role;
use sitetrack_core::credentials::validate_new_password;
use sitetrack_core::customer::{normalize_email, validate_email, validate_required_text};
use sitetrack_core::error::CoreError;
use sitetrack_core::roles::Role;
use sitetrack_db::models::credential::{CreateCredential, Credential, CredentialResponse};
use sitetrack_db::models::customer::Customer;
use sitetrack_db::repositories::{CredentialRepo, CustomerRepo};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for the login endpoints.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `PUT /auth/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful authentication response returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Public credential info, with the customer profile for customer callers.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    #[serde(flatten)]
    pub credential: CredentialResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create an admin credential. Open while no admin exists; afterwards the
/// request must carry an admin token.
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    if CredentialRepo::role_exists(&state.pool, Role::Admin).await? {
        let user = AuthUser::from_headers(&headers, &state.config.jwt)?;
        require_role(user.role, Role::Admin)?;
    }

    validate_required_text("name", &input.name)?;
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    validate_new_password(&input.password)?;

    if CredentialRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "A user with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)?;

    let credential = CredentialRepo::create(
        &state.pool,
        &CreateCredential {
            name: input.name.trim().to_string(),
            email,
            password_hash,
            role: Role::Admin,
        },
    )
    .await?;

    tracing::info!(credential_id = credential.id, "Admin registered");

    let response = auth_response(&state, &credential, None)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/admin-login
pub async fn admin_login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let credential = authenticate(&state, &input, Role::Admin).await?;
    Ok(Json(auth_response(&state, &credential, None)?))
}

/// POST /api/auth/customer-login
///
/// The response embeds the caller's customer profile.
pub async fn customer_login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let credential = authenticate(&state, &input, Role::Customer).await?;
    let customer = CustomerRepo::find_by_credential_id(&state.pool, credential.id)
        .await?
        .ok_or(AppError::Core(CoreError::ProfileMissing {
            credential_id: credential.id,
        }))?;
    Ok(Json(auth_response(&state, &credential, Some(customer))?))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<UserInfo>> {
    let credential = CredentialRepo::find_by_id(&state.pool, user.credential_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Account no longer exists".into()))
        })?;

    let customer = match credential.role {
        Role::Admin => None,
        Role::Customer => Some(
            CustomerRepo::find_by_credential_id(&state.pool, credential.id)
                .await?
                .ok_or(AppError::Core(CoreError::ProfileMissing {
                    credential_id: credential.id,
                }))?,
        ),
    };

    Ok(Json(UserInfo {
        credential: CredentialResponse::from(&credential),
        customer,
    }))
}

/// PUT /api/auth/password
///
/// Change the caller's own password. Returns 204 No Content.
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    validate_new_password(&input.new_password)?;

    let credential = CredentialRepo::find_by_id(&state.pool, user.credential_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Account no longer exists".into()))
        })?;

    let current_valid = verify_password(&input.current_password, &credential.password_hash)?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Current password is incorrect".into(),
        )));
    }

    let password_hash = hash_password(&input.new_password)?;
    CredentialRepo::update_password(&state.pool, credential.id, &password_hash).await?;

    tracing::info!(credential_id = credential.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Check email + password against a credential holding `role`.
///
/// Unknown emails, wrong passwords and role mismatches all yield the same
/// 401 so the endpoint does not reveal which accounts exist.
async fn authenticate(state: &AppState, input: &LoginRequest, role: Role) -> AppResult<Credential> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Email and password are required".into(),
        )));
    }

    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid credentials".into()));

    let credential = CredentialRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .filter(|c| c.role == role)
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &credential.password_hash)?;
    if !password_valid {
        return Err(invalid());
    }

    tracing::info!(credential_id = credential.id, role = %role, "Login succeeded");
    Ok(credential)
}

fn auth_response(
    state: &AppState,
    credential: &Credential,
    customer: Option<Customer>,
) -> AppResult<AuthResponse> {
    let token = generate_access_token(credential.id, credential.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        token,
        user: UserInfo {
            credential: CredentialResponse::from(credential),
            customer,
        },
    })
}
