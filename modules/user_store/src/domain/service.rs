use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{FieldMetadata, NewUser, StorageInfo, User, UserPatch, UserQuery};
use crate::domain::error::DomainError;
use crate::domain::metadata;
use crate::domain::query::{SortOrder, UserFilter, Window};
use crate::domain::repo::{UserDraft, UsersRepository};
use crate::domain::seed;
use crate::domain::validation::{validate_batch, validate_new_user, validate_patch};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    config: ServiceConfig,
    stats: Arc<OpStats>,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 1000,
        }
    }
}

#[derive(Debug, Default)]
struct OpStats {
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    queries: AtomicU64,
}

impl OpStats {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }
}

fn draft_from(new_user: NewUser, now: DateTime<Utc>) -> UserDraft {
    UserDraft {
        name: new_user.name,
        email: new_user.email,
        department: new_user.department,
        role: new_user.role,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repo: Arc<dyn UsersRepository>, config: ServiceConfig) -> Self {
        Self {
            repo,
            config,
            stats: Arc::new(OpStats::default()),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn query_served(&self) {
        OpStats::bump(&self.stats.queries, 1);
    }

    #[instrument(
        name = "user_store.service.create_user",
        skip(self),
        fields(email = %new_user.email, name = %new_user.name)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        validate_new_user(&new_user)?;

        let user = self.repo.insert(draft_from(new_user, Utc::now())).await?;
        OpStats::bump(&self.stats.inserts, 1);

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "user_store.service.get_user_opt", skip(self), fields(user_id = id))]
    pub async fn get_user_opt(&self, id: i64) -> Result<Option<User>, DomainError> {
        debug!("Getting user by id");
        let user = self.repo.find_by_id(id).await?;
        self.query_served();
        Ok(user)
    }

    #[instrument(name = "user_store.service.find_user_by_id", skip(self), fields(user_id = id))]
    pub async fn find_user_by_id(&self, id: i64) -> Result<User, DomainError> {
        let user = self
            .get_user_opt(id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        debug!("Successfully retrieved user");
        Ok(user)
    }

    #[instrument(name = "user_store.service.find_all", skip(self))]
    pub async fn find_all(&self) -> Result<Vec<User>, DomainError> {
        let users = self.repo.list_all().await?;
        self.query_served();
        debug!("Found {} users", users.len());
        Ok(users)
    }

    /// Active users of `department`, ordered by name.
    #[instrument(name = "user_store.service.find_users_by_department", skip(self))]
    pub async fn find_users_by_department(
        &self,
        department: &str,
    ) -> Result<Vec<User>, DomainError> {
        let users = self
            .repo
            .find_matching(&UserFilter::active_in(department), SortOrder::ByName, None)
            .await?;
        self.query_served();
        debug!("Found {} users in department", users.len());
        Ok(users)
    }

    #[instrument(name = "user_store.service.update_user", skip(self), fields(user_id = id))]
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        validate_patch(&patch)?;

        // read-merge-write happens atomically inside the repository
        let user = self
            .repo
            .apply_patch(id, &patch, Utc::now())
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        OpStats::bump(&self.stats.updates, 1);

        info!("Successfully updated user");
        Ok(user)
    }

    /// `true` when a record was removed; an unknown id is not an error.
    #[instrument(name = "user_store.service.delete_user", skip(self), fields(user_id = id))]
    pub async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        info!("Deleting user");

        let deleted = self.repo.delete(id).await?;
        if deleted {
            OpStats::bump(&self.stats.deletes, 1);
            info!("Successfully deleted user");
        } else {
            debug!("Nothing to delete");
        }
        Ok(deleted)
    }

    /// Number of active users in `department`.
    #[instrument(name = "user_store.service.count_by_department", skip(self))]
    pub async fn count_by_department(&self, department: &str) -> Result<u64, DomainError> {
        let count = self
            .repo
            .count_matching(&UserFilter::active_in(department))
            .await?;
        self.query_served();
        Ok(count)
    }

    #[instrument(name = "user_store.service.search_users", skip(self), fields(limit = query.limit, offset = query.offset))]
    pub async fn search_users(&self, query: UserQuery) -> Result<Vec<User>, DomainError> {
        let limit = query.limit.min(self.config.max_page_size);
        let window = Window::new(u64::from(query.offset), u64::from(limit));
        let users = self
            .repo
            .find_matching(&query.filter(), SortOrder::ById, Some(window))
            .await?;
        self.query_served();
        debug!("Search returned {} users", users.len());
        Ok(users)
    }

    /// Zero-based page of users in id order.
    #[instrument(name = "user_store.service.find_users_with_pagination", skip(self))]
    pub async fn find_users_with_pagination(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Vec<User>, DomainError> {
        if size == 0 {
            return Err(DomainError::validation("size", "size must be greater than 0"));
        }
        let size = size.min(self.config.max_page_size);
        let window = Window::new(u64::from(page) * u64::from(size), u64::from(size));
        let users = self
            .repo
            .find_matching(&UserFilter::all(), SortOrder::ById, Some(window))
            .await?;
        self.query_served();
        Ok(users)
    }

    /// Insert every user or none. Returns how many were stored.
    #[instrument(name = "user_store.service.batch_insert_users", skip(self, users), fields(batch = users.len()))]
    pub async fn batch_insert_users(&self, users: Vec<NewUser>) -> Result<usize, DomainError> {
        info!("Inserting batch");

        validate_batch(&users)?;
        if users.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let drafts = users.into_iter().map(|u| draft_from(u, now)).collect();
        let stored = self.repo.insert_all(drafts).await?;
        OpStats::bump(&self.stats.inserts, stored.len() as u64);

        info!("Inserted {} users", stored.len());
        Ok(stored.len())
    }

    /// Same atomic path as [`Service::batch_insert_users`], reported as a flag.
    #[instrument(name = "user_store.service.transfer_data", skip(self, users), fields(batch = users.len()))]
    pub async fn transfer_data(&self, users: Vec<NewUser>) -> Result<bool, DomainError> {
        match self.batch_insert_users(users).await {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!("Transfer rolled back: {}", e);
                Err(e)
            }
        }
    }

    #[instrument(name = "user_store.service.storage_info", skip(self))]
    pub async fn storage_info(&self) -> Result<StorageInfo, DomainError> {
        let user_count = self.repo.count_all().await?;
        Ok(StorageInfo {
            backend: self.repo.backend().to_string(),
            location: self.repo.location(),
            user_count,
            inserts: self.stats.inserts.load(Ordering::Relaxed),
            updates: self.stats.updates.load(Ordering::Relaxed),
            deletes: self.stats.deletes.load(Ordering::Relaxed),
            queries: self.stats.queries.load(Ordering::Relaxed),
        })
    }

    #[instrument(name = "user_store.service.ping", skip(self))]
    pub async fn ping(&self) -> Result<String, DomainError> {
        self.repo.ping().await?;
        Ok(format!("{} storage is reachable", self.repo.backend()))
    }

    pub fn entity_metadata(&self) -> Vec<FieldMetadata> {
        metadata::user_fields()
    }

    #[instrument(name = "user_store.service.seed_sample_users", skip(self))]
    pub async fn seed_sample_users(&self) -> Result<usize, DomainError> {
        let inserted = self.batch_insert_users(seed::sample_users()).await?;
        info!("Seeded {} sample users", inserted);
        Ok(inserted)
    }
}
