use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UserStoreApi,
    error::UserStoreError,
    model::{NewUser, User, UserPatch, UserQuery},
};
use crate::domain::service::Service;

/// Local implementation of the UserStoreApi trait that delegates to the domain service
pub struct UserStoreLocalClient {
    service: Arc<Service>,
}

impl UserStoreLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UserStoreApi for UserStoreLocalClient {
    async fn create_user(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        self.service.create_user(new_user).await.map_err(Into::into)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, UserStoreError> {
        self.service.get_user_opt(id).await.map_err(Into::into)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, UserStoreError> {
        self.service
            .update_user(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, UserStoreError> {
        self.service.delete_user(id).await.map_err(Into::into)
    }

    async fn search_users(&self, query: UserQuery) -> Result<Vec<User>, UserStoreError> {
        self.service.search_users(query).await.map_err(Into::into)
    }

    async fn count_by_department(&self, department: &str) -> Result<u64, UserStoreError> {
        self.service
            .count_by_department(department)
            .await
            .map_err(Into::into)
    }

    async fn batch_insert_users(&self, users: Vec<NewUser>) -> Result<usize, UserStoreError> {
        self.service
            .batch_insert_users(users)
            .await
            .map_err(Into::into)
    }
}
