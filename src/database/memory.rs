use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::models::{DataItem, DataItemChanges, NewDataItem, NewUser, User};
use crate::database::store::{DatabaseError, PrincipalStore, Repository, ResourceStore};
use crate::types::{Credential, Principal};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    items: BTreeMap<i64, DataItem>,
    last_user_id: i64,
    last_item_id: i64,
}

/// In-process repository; ids are assigned sequentially starting at 1
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a user's active flag, returns false when the user does not exist
    pub async fn set_user_active(&self, id: i64, active: bool) -> bool {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl PrincipalStore for MemoryDatabase {
    async fn find_principal_by_username(&self, username: &str) -> Result<Option<Principal>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .map(User::principal))
    }

    async fn find_principal_by_id(&self, id: i64) -> Result<Option<Principal>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(User::principal))
    }

    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .map(|u| Credential {
                username: u.username.clone(),
                password_hash: u.hashed_password.clone(),
            }))
    }
}

#[async_trait]
impl ResourceStore for MemoryDatabase {
    async fn find_resource_owner(&self, resource_id: i64) -> Result<Option<i64>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.items.get(&resource_id).map(|item| item.user_id))
    }
}

#[async_trait]
impl Repository for MemoryDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict("Username already registered".to_string()));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("Email already registered".to_string()));
        }

        tables.last_user_id += 1;
        let record = User {
            id: tables.last_user_id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: true,
            user_type: user.user_type,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self, skip: usize, limit: usize) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().skip(skip).take(limit).cloned().collect())
    }

    async fn create_item(&self, item: NewDataItem) -> Result<DataItem, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.last_item_id += 1;
        let record = DataItem {
            id: tables.last_item_id,
            title: item.title,
            content: item.content,
            user_id: item.user_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.items.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_item(&self, id: i64) -> Result<Option<DataItem>, DatabaseError> {
        Ok(self.tables.read().await.items.get(&id).cloned())
    }

    async fn list_items(&self, owner: Option<i64>, skip: usize, limit: usize) -> Result<Vec<DataItem>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|item| owner.map_or(true, |id| item.user_id == id))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_item(&self, id: i64, changes: DataItemChanges) -> Result<Option<DataItem>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            item.title = title;
        }
        if let Some(content) = changes.content {
            item.content = content;
        }
        item.updated_at = Some(Utc::now());
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.items.remove(&id).is_some())
    }
}
