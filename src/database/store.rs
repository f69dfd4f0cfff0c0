use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::{DataItem, DataItemChanges, NewDataItem, NewUser, User};
use crate::types::{Credential, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Principal lookups consumed by the authentication pipeline
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_principal_by_username(&self, username: &str) -> Result<Option<Principal>, DatabaseError>;

    async fn find_principal_by_id(&self, id: i64) -> Result<Option<Principal>, DatabaseError>;

    async fn find_credential(&self, username: &str) -> Result<Option<Credential>, DatabaseError>;
}

/// Ownership lookup consumed by the access policy
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find_resource_owner(&self, resource_id: i64) -> Result<Option<i64>, DatabaseError>;
}

/// Full storage surface used by the HTTP handlers
#[async_trait]
pub trait Repository: PrincipalStore + ResourceStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn list_users(&self, skip: usize, limit: usize) -> Result<Vec<User>, DatabaseError>;

    async fn create_item(&self, item: NewDataItem) -> Result<DataItem, DatabaseError>;

    async fn get_item(&self, id: i64) -> Result<Option<DataItem>, DatabaseError>;

    /// Items owned by `owner`, or every item when `owner` is `None`
    async fn list_items(&self, owner: Option<i64>, skip: usize, limit: usize) -> Result<Vec<DataItem>, DatabaseError>;

    async fn update_item(&self, id: i64, changes: DataItemChanges) -> Result<Option<DataItem>, DatabaseError>;

    async fn delete_item(&self, id: i64) -> Result<bool, DatabaseError>;
}
