//! Analytics - counters kept up to date from identity and faculty events

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::bus::DispatchContext;
use crate::error::HandlerError;
use crate::events::{FacultyCreated, Notification, Role, UserCreated, UserDeleted};
use crate::handler::Handler;

/// Snapshot of the analytics counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub students: u64,
    pub professors: u64,
    pub admins: u64,
    pub faculties: u64,
}

impl Counts {
    pub fn for_role(&self, role: Role) -> u64 {
        match role {
            Role::Student => self.students,
            Role::Professor => self.professors,
            Role::Admin => self.admins,
        }
    }

    fn slot(&mut self, role: Role) -> &mut u64 {
        match role {
            Role::Student => &mut self.students,
            Role::Professor => &mut self.professors,
            Role::Admin => &mut self.admins,
        }
    }

    pub fn total_users(&self) -> u64 {
        self.students + self.professors + self.admins
    }
}

/// Shared counter store owned by the analytics module
#[derive(Clone, Default)]
pub struct Analytics {
    counts: Arc<RwLock<Counts>>,
}

impl Analytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> Counts {
        self.counts.read().await.clone()
    }

    /// Handler that maintains the per-role user counters
    pub fn role_counter(&self) -> RoleCounterHandler {
        RoleCounterHandler {
            counts: self.counts.clone(),
        }
    }

    /// Handler that counts created faculties
    pub fn faculty_counter(&self) -> FacultyCounterHandler {
        FacultyCounterHandler {
            counts: self.counts.clone(),
        }
    }
}

pub struct RoleCounterHandler {
    counts: Arc<RwLock<Counts>>,
}

#[async_trait]
impl Handler<UserCreated> for RoleCounterHandler {
    fn name(&self) -> &str {
        "analytics.role-counter"
    }

    async fn handle(&self, notification: &Notification<UserCreated>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        let role = notification.event().role;
        let mut counts = self.counts.write().await;
        *counts.slot(role) += 1;
        debug!(%role, count = counts.for_role(role), "RoleCounterHandler: incremented");
        Ok(())
    }
}

#[async_trait]
impl Handler<UserDeleted> for RoleCounterHandler {
    fn name(&self) -> &str {
        "analytics.role-counter"
    }

    async fn handle(&self, notification: &Notification<UserDeleted>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        let role = notification.event().role;
        let mut counts = self.counts.write().await;
        let slot = counts.slot(role);
        *slot = slot.saturating_sub(1);
        debug!(%role, count = counts.for_role(role), "RoleCounterHandler: decremented");
        Ok(())
    }
}

pub struct FacultyCounterHandler {
    counts: Arc<RwLock<Counts>>,
}

#[async_trait]
impl Handler<FacultyCreated> for FacultyCounterHandler {
    fn name(&self) -> &str {
        "analytics.faculty-counter"
    }

    async fn handle(&self, _notification: &Notification<FacultyCreated>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        self.counts.write().await.faculties += 1;
        Ok(())
    }
}
