//! Identity module - user accounts

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::ModuleError;
use crate::bus::EventBus;
use crate::cancel::Cancellation;
use crate::events::{Role, UserCreated, UserDeleted};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub faculty_id: Option<Uuid>,
    pub role: Role,
    pub index_number: Option<String>,
}

/// Input for `IdentityService::create_user`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub faculty_id: Option<Uuid>,
    pub role: Role,
    pub index_number: Option<String>,
}

impl From<&User> for UserCreated {
    fn from(user: &User) -> Self {
        UserCreated {
            user_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            faculty_id: user.faculty_id,
            role: user.role,
            index_number: user.index_number.clone(),
        }
    }
}

/// In-memory user store
#[derive(Clone, Default)]
pub struct UserDirectory {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.users.read().await.values().find(|u| u.username == username).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

/// Write side of the identity module
#[derive(Clone)]
pub struct IdentityService {
    directory: UserDirectory,
    bus: EventBus,
}

impl IdentityService {
    pub fn new(directory: UserDirectory, bus: EventBus) -> Self {
        Self { directory, bus }
    }

    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Store a new user, then raise `UserCreated`
    ///
    /// On `ModuleError::Dispatch` the user is already stored; handlers that ran
    /// before the failure keep their effects.
    pub async fn create_user(&self, new_user: NewUser, cancel: &Cancellation) -> Result<User, ModuleError> {
        if new_user.role == Role::Student && new_user.index_number.is_none() {
            return Err(ModuleError::MissingIndexNumber);
        }

        let user = {
            let mut users = self.directory.users.write().await;
            if users.values().any(|u| u.username == new_user.username) {
                return Err(ModuleError::DuplicateUsername(new_user.username));
            }

            let user = User {
                id: Uuid::now_v7(),
                username: new_user.username,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                faculty_id: new_user.faculty_id,
                role: new_user.role,
                index_number: new_user.index_number,
            };
            users.insert(user.id, user.clone());
            user
        };
        info!(user_id = %user.id, username = %user.username, role = %user.role, "IdentityService: user created");

        if let Err(e) = self.bus.dispatch(UserCreated::from(&user), cancel).await {
            warn!(user_id = %user.id, error = %e, "IdentityService: user stored but UserCreated dispatch failed");
            return Err(e.into());
        }
        Ok(user)
    }

    /// Remove a user, then raise `UserDeleted`
    pub async fn delete_user(&self, id: Uuid, cancel: &Cancellation) -> Result<User, ModuleError> {
        let user = self
            .directory
            .users
            .write()
            .await
            .remove(&id)
            .ok_or(ModuleError::UserNotFound(id))?;
        info!(user_id = %user.id, "IdentityService: user deleted");

        self.bus
            .dispatch(
                UserDeleted {
                    user_id: user.id,
                    faculty_id: user.faculty_id,
                    role: user.role,
                },
                cancel,
            )
            .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusConfig;
    use crate::registry::HandlerRegistry;

    fn service() -> IdentityService {
        let bus = EventBus::new(Arc::new(HandlerRegistry::empty()), BusConfig::default());
        IdentityService::new(UserDirectory::new(), bus)
    }

    fn admin(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Admin".to_string(),
            faculty_id: None,
            role: Role::Admin,
            index_number: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let service = service();
        let user = service.create_user(admin("ada"), &Cancellation::new()).await.unwrap();

        assert_eq!(service.directory().get(user.id).await, Some(user.clone()));
        assert_eq!(service.directory().find_by_username("ada").await, Some(user));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let service = service();
        let cancel = Cancellation::new();
        service.create_user(admin("ada"), &cancel).await.unwrap();

        let err = service.create_user(admin("ada"), &cancel).await.unwrap_err();

        assert!(matches!(err, ModuleError::DuplicateUsername(ref name) if name == "ada"));
        assert!(!err.is_committed());
        assert_eq!(service.directory().len().await, 1);
    }

    #[tokio::test]
    async fn test_student_requires_index_number() {
        let service = service();
        let student = NewUser {
            role: Role::Student,
            ..admin("stu")
        };

        let err = service.create_user(student, &Cancellation::new()).await.unwrap_err();

        assert!(matches!(err, ModuleError::MissingIndexNumber));
        assert!(service.directory().is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let service = service();
        let cancel = Cancellation::new();
        let user = service.create_user(admin("ada"), &cancel).await.unwrap();

        let removed = service.delete_user(user.id, &cancel).await.unwrap();
        assert_eq!(removed.id, user.id);

        let err = service.delete_user(user.id, &cancel).await.unwrap_err();
        assert!(matches!(err, ModuleError::UserNotFound(id) if id == user.id));
    }

    #[test]
    fn test_user_created_from_user() {
        let user = User {
            id: Uuid::now_v7(),
            username: "s1".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            faculty_id: Some(Uuid::now_v7()),
            role: Role::Student,
            index_number: Some("2022/001".to_string()),
        };

        let event = UserCreated::from(&user);

        assert_eq!(event.user_id, user.id);
        assert_eq!(event.faculty_id, user.faculty_id);
        assert_eq!(event.index_number, user.index_number);
        assert_eq!(event.role, Role::Student);
    }
}
