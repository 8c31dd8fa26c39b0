//! Faculty module - faculties and their member rosters

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::ModuleError;
use crate::bus::{DispatchContext, EventBus};
use crate::cancel::Cancellation;
use crate::error::HandlerError;
use crate::events::{FacultyCreated, Notification, Role, UserCreated, UserDeleted};
use crate::handler::Handler;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Faculty {
    pub id: Uuid,
    pub name: String,
    pub students: Vec<Uuid>,
    pub professors: Vec<Uuid>,
}

impl Faculty {
    fn members_mut(&mut self, role: Role) -> Option<&mut Vec<Uuid>> {
        match role {
            Role::Student => Some(&mut self.students),
            Role::Professor => Some(&mut self.professors),
            Role::Admin => None,
        }
    }
}

/// In-memory faculty store
#[derive(Clone, Default)]
pub struct FacultyRoster {
    faculties: Arc<RwLock<HashMap<Uuid, Faculty>>>,
}

impl FacultyRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: Uuid) -> Option<Faculty> {
        self.faculties.read().await.get(&id).cloned()
    }

    pub async fn find_by_name(&self, name: &str) -> Option<Faculty> {
        self.faculties.read().await.values().find(|f| f.name == name).cloned()
    }

    /// All faculties, sorted by name
    pub async fn list(&self) -> Vec<Faculty> {
        let mut faculties: Vec<Faculty> = self.faculties.read().await.values().cloned().collect();
        faculties.sort_by(|a, b| a.name.cmp(&b.name));
        faculties
    }

    async fn insert(&self, faculty: Faculty) {
        self.faculties.write().await.insert(faculty.id, faculty);
    }

    /// Handler that adds and removes roster members on identity events
    pub fn membership_handler(&self) -> MembershipHandler {
        MembershipHandler { roster: self.clone() }
    }
}

/// Write side of the faculty module
#[derive(Clone)]
pub struct FacultyService {
    roster: FacultyRoster,
    bus: EventBus,
}

impl FacultyService {
    pub fn new(roster: FacultyRoster, bus: EventBus) -> Self {
        Self { roster, bus }
    }

    pub fn roster(&self) -> &FacultyRoster {
        &self.roster
    }

    /// Create a faculty, then raise `FacultyCreated`
    pub async fn create_faculty(&self, name: &str, cancel: &Cancellation) -> Result<Faculty, ModuleError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ModuleError::EmptyFacultyName);
        }

        let faculty = Faculty {
            id: Uuid::now_v7(),
            name: name.to_string(),
            students: Vec::new(),
            professors: Vec::new(),
        };
        self.roster.insert(faculty.clone()).await;
        info!(faculty_id = %faculty.id, name = %faculty.name, "FacultyService: faculty created");

        self.bus
            .dispatch(
                FacultyCreated {
                    faculty_id: faculty.id,
                    name: faculty.name.clone(),
                },
                cancel,
            )
            .await?;
        Ok(faculty)
    }
}

/// Keeps faculty rosters in sync with user accounts
///
/// Fails when a user references a faculty the roster does not know.
pub struct MembershipHandler {
    roster: FacultyRoster,
}

#[async_trait]
impl Handler<UserCreated> for MembershipHandler {
    fn name(&self) -> &str {
        "faculty.membership"
    }

    async fn handle(&self, notification: &Notification<UserCreated>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        let event = notification.event();
        let Some(faculty_id) = event.faculty_id else {
            return Ok(());
        };

        let mut faculties = self.roster.faculties.write().await;
        let faculty = faculties.get_mut(&faculty_id).ok_or_else(|| HandlerError::NotFound {
            entity: "faculty",
            id: faculty_id.to_string(),
        })?;

        if let Some(members) = faculty.members_mut(event.role) {
            if !members.contains(&event.user_id) {
                members.push(event.user_id);
            }
            debug!(%faculty_id, user_id = %event.user_id, role = %event.role, "MembershipHandler: member added");
        }
        Ok(())
    }
}

#[async_trait]
impl Handler<UserDeleted> for MembershipHandler {
    fn name(&self) -> &str {
        "faculty.membership"
    }

    async fn handle(&self, notification: &Notification<UserDeleted>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        let event = notification.event();
        let Some(faculty_id) = event.faculty_id else {
            return Ok(());
        };

        // Faculty may be gone already; nothing to remove then
        let mut faculties = self.roster.faculties.write().await;
        if let Some(members) = faculties.get_mut(&faculty_id).and_then(|f| f.members_mut(event.role)) {
            members.retain(|id| *id != event.user_id);
            debug!(%faculty_id, user_id = %event.user_id, "MembershipHandler: member removed");
        }
        Ok(())
    }
}
