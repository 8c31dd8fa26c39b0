//! Event types raised by the platform modules
//!
//! - Identity: `UserCreated`, `UserDeleted`
//! - Faculty: `FacultyCreated`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Event;

/// Platform role of a user account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Student,
    Professor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Professor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Professor => "professor",
            Role::Admin => "admin",
        }
    }

    /// Whether accounts with this role belong to a faculty roster
    pub fn is_faculty_member(&self) -> bool {
        matches!(self, Role::Student | Role::Professor)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account has been created by the identity module
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub faculty_id: Option<Uuid>,
    pub role: Role,
    /// Student index number, only set for students
    pub index_number: Option<String>,
}

impl Event for UserCreated {
    const NAME: &'static str = "UserCreated";
}

/// A user account has been removed by the identity module
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeleted {
    pub user_id: Uuid,
    pub faculty_id: Option<Uuid>,
    pub role: Role,
}

impl Event for UserDeleted {
    const NAME: &'static str = "UserDeleted";
}

/// A faculty has been created by the faculty module
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyCreated {
    pub faculty_id: Uuid,
    pub name: String,
}

impl Event for FacultyCreated {
    const NAME: &'static str = "FacultyCreated";
}
