//! Caller identity and the ownership policy.
//!
//! Every protected route resolves the bearer token into a [`Caller`] before
//! any business logic runs. Admin-only routes use [`require_role`]; routes a
//! customer may read use [`Caller::require_owner_or_admin`] against the
//! customer profile that ultimately owns the resource (the profile itself,
//! the project's customer, or the update's project's customer).

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// A fully resolved caller.
///
/// Customer callers always carry their own customer profile id. A customer
/// credential without a profile cannot be turned into a `Caller`, see
/// [`Caller::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Admin { credential_id: DbId },
    Customer { credential_id: DbId, customer_id: DbId },
}

impl Caller {
    /// Build a caller from token claims and the result of the profile lookup.
    ///
    /// `profile_id` is only consulted for customer-role credentials; a missing
    /// profile yields [`CoreError::ProfileMissing`].
    pub fn resolve(
        credential_id: DbId,
        role: Role,
        profile_id: Option<DbId>,
    ) -> Result<Self, CoreError> {
        match role {
            Role::Admin => Ok(Caller::Admin { credential_id }),
            Role::Customer => profile_id
                .map(|customer_id| Caller::Customer {
                    credential_id,
                    customer_id,
                })
                .ok_or(CoreError::ProfileMissing { credential_id }),
        }
    }

    pub fn credential_id(&self) -> DbId {
        match *self {
            Caller::Admin { credential_id } | Caller::Customer { credential_id, .. } => {
                credential_id
            }
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Caller::Admin { .. } => Role::Admin,
            Caller::Customer { .. } => Role::Customer,
        }
    }

    /// The caller's own customer profile id, or `None` for admins.
    ///
    /// List queries use this as a filter: `None` means "no restriction".
    pub fn customer_id(&self) -> Option<DbId> {
        match *self {
            Caller::Admin { .. } => None,
            Caller::Customer { customer_id, .. } => Some(customer_id),
        }
    }

    /// Admins pass unconditionally; customers pass only for resources owned
    /// by their own profile.
    pub fn require_owner_or_admin(&self, owner_customer_id: DbId) -> Result<(), CoreError> {
        match *self {
            Caller::Admin { .. } => Ok(()),
            Caller::Customer { customer_id, .. } if customer_id == owner_customer_id => Ok(()),
            Caller::Customer { .. } => Err(CoreError::Forbidden(
                "Not authorized to access this resource".into(),
            )),
        }
    }
}

/// Fail with [`CoreError::Forbidden`] unless `actual` is `required`.
pub fn require_role(actual: Role, required: Role) -> Result<(), CoreError> {
    if actual == required {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!("{required} role required")))
    }
}
