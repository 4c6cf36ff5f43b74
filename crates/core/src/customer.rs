//! Customer profile field rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Longest accepted free-text field (name, address, site location).
pub const MAX_TEXT_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingType {
    Residential,
    Commercial,
}

impl BuildingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildingType::Residential => "Residential",
            BuildingType::Commercial => "Commercial",
        }
    }
}

impl FromStr for BuildingType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Residential" => Ok(BuildingType::Residential),
            "Commercial" => Ok(BuildingType::Commercial),
            other => Err(CoreError::Validation(format!(
                "Unknown building type '{other}'. Must be Residential or Commercial"
            ))),
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trim and lowercase an email address so uniqueness checks are
/// case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal structural email check: exactly one `@`, a non-empty local part,
/// and a dotted domain with no empty labels.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let invalid = || CoreError::Validation(format!("Invalid email address '{email}'"));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }
    Ok(())
}

/// Require a non-blank text field no longer than [`MAX_TEXT_LEN`].
pub fn validate_required_text(field: &str, value: &str) -> Result<(), CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_square_feet(square_feet: i32) -> Result<(), CoreError> {
    if square_feet <= 0 {
        return Err(CoreError::Validation(
            "square_feet must be a positive number".into(),
        ));
    }
    Ok(())
}
