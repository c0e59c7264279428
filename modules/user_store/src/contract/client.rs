use async_trait::async_trait;

use crate::contract::{
    error::UserStoreError,
    model::{NewUser, User, UserPatch, UserQuery},
};

/// Public API trait for the user store that other crates can use
#[async_trait]
pub trait UserStoreApi: Send + Sync {
    /// Create a new user
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserStoreError>;

    /// Get a user by ID, `None` when it does not exist
    async fn find_user(&self, id: i64) -> Result<Option<User>, UserStoreError>;

    /// Update a user with partial data
    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, UserStoreError>;

    /// Delete a user by ID; `false` when there was nothing to delete
    async fn delete_user(&self, id: i64) -> Result<bool, UserStoreError>;

    /// Filtered search with offset paging
    async fn search_users(&self, query: UserQuery) -> Result<Vec<User>, UserStoreError>;

    /// Active users of a department
    async fn count_by_department(&self, department: &str) -> Result<u64, UserStoreError>;

    /// Insert all users or none of them
    async fn batch_insert_users(&self, users: Vec<NewUser>) -> Result<usize, UserStoreError>;
}
