//! Platform modules that raise and consume events
//!
//! - [`identity`] - user accounts; raises `UserCreated` and `UserDeleted`
//! - [`faculty`] - faculties and their rosters; raises `FacultyCreated`
//! - [`analytics`] - role and faculty counters; consumes all of the above
//!
//! Module state is in memory. Each write commits before its event is raised,
//! so a failing handler leaves the write in place and the caller sees the error.

pub mod analytics;
pub mod faculty;
pub mod identity;

use thiserror::Error;
use uuid::Uuid;

use crate::error::DispatchError;

/// Errors returned by module write operations
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Student accounts require an index number")]
    MissingIndexNumber,

    #[error("Faculty name must not be empty")]
    EmptyFacultyName,

    /// The write committed but event delivery failed
    #[error("Write committed but event dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl ModuleError {
    /// Whether the module's own write was applied before the failure
    pub fn is_committed(&self) -> bool {
        matches!(self, ModuleError::Dispatch(_))
    }
}
