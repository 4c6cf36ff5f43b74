//! Project status lifecycle.
//!
//! A project moves `Not Started -> In Progress -> Completed`, driven by the
//! progress reported on each update. Direct admin edits may set any status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const MIN_PROGRESS: i32 = 0;
pub const MAX_PROGRESS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::NotStarted => "Not Started",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::NotStarted
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Started" => Ok(ProjectStatus::NotStarted),
            "In Progress" => Ok(ProjectStatus::InProgress),
            "Completed" => Ok(ProjectStatus::Completed),
            other => Err(CoreError::Validation(format!(
                "Unknown project status '{other}'. Must be one of: Not Started, In Progress, Completed"
            ))),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate that `progress` is a percentage in `0..=100`.
pub fn validate_progress(progress: i32) -> Result<(), CoreError> {
    if (MIN_PROGRESS..=MAX_PROGRESS).contains(&progress) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Progress must be between {MIN_PROGRESS} and {MAX_PROGRESS}, got {progress}"
        )))
    }
}

/// Project fields derived from the progress reported by a new update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressOutcome {
    pub progress: i32,
    pub status: ProjectStatus,
    pub actual_end_date: Option<Timestamp>,
}

/// Compute the project's new progress, status and actual end date.
///
/// - `100` completes the project and stamps `actual_end_date` (an existing
///   stamp on an already completed project is kept).
/// - `1..=99` moves the project to `In Progress` and clears any end date.
/// - `0` records the progress but leaves status and end date untouched.
///
/// Callers validate `progress` first; this function does not range-check.
pub fn apply_progress(
    current_status: ProjectStatus,
    current_end_date: Option<Timestamp>,
    progress: i32,
    now: Timestamp,
) -> ProgressOutcome {
    let (status, actual_end_date) = if progress >= MAX_PROGRESS {
        let end = match (current_status, current_end_date) {
            (ProjectStatus::Completed, Some(existing)) => existing,
            _ => now,
        };
        (ProjectStatus::Completed, Some(end))
    } else if progress > MIN_PROGRESS {
        (ProjectStatus::InProgress, None)
    } else {
        (current_status, current_end_date)
    };

    ProgressOutcome {
        progress,
        status,
        actual_end_date,
    }
}
