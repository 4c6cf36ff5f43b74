//! Credential roles.
//!
//! A role is fixed when the credential is created; there is no transition
//! between roles. The spellings must match the `credentials.role` CHECK
//! constraint in the initial migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

/// The role carried by a credential and by every access token issued for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Customer => ROLE_CUSTOMER,
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_CUSTOMER => Ok(Role::Customer),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
