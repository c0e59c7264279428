use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::contract::model::{User, UserPatch};
use crate::domain::query::{SortOrder, UserFilter, Window};

/// Failures a repository reports to the domain.
#[derive(Error, Debug)]
pub enum RepoError {
    /// Another record already holds this email.
    #[error("email '{email}' is already taken")]
    EmailTaken { email: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// A validated record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDraft {
    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            department: self.department,
            role: self.role,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Copy the supplied fields of `patch` onto `user` and restamp it.
///
/// `updated_at` becomes `now`, or 1µs past the previous stamp when the clock
/// has not moved beyond it, so it strictly increases with every update.
pub fn merge_patch(user: &mut User, patch: &UserPatch, now: DateTime<Utc>) {
    if let Some(name) = &patch.name {
        user.name.clone_from(name);
    }
    if let Some(email) = &patch.email {
        user.email.clone_from(email);
    }
    if let Some(department) = &patch.department {
        user.department.clone_from(department);
    }
    if let Some(role) = &patch.role {
        user.role.clone_from(role);
    }
    if let Some(active) = patch.active {
        user.active = active;
    }
    user.updated_at = now.max(user.updated_at + Duration::microseconds(1));
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
///
/// Email uniqueness is enforced here, atomically with the write that could
/// break it.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Short backend name, e.g. `memory` or `sqlite`.
    fn backend(&self) -> &'static str;

    /// Connection string or similar, when the backend has one.
    fn location(&self) -> Option<String> {
        None
    }

    /// Cheap round trip proving the store is reachable.
    async fn ping(&self) -> RepoResult<()>;

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;

    /// All users in id order.
    async fn list_all(&self) -> RepoResult<Vec<User>>;

    /// Users matching `filter` in `order`, optionally windowed.
    async fn find_matching(
        &self,
        filter: &UserFilter,
        order: SortOrder,
        window: Option<Window>,
    ) -> RepoResult<Vec<User>>;

    async fn count_matching(&self, filter: &UserFilter) -> RepoResult<u64>;

    async fn count_all(&self) -> RepoResult<u64> {
        self.count_matching(&UserFilter::all()).await
    }

    /// Assign the next id and store the draft.
    async fn insert(&self, draft: UserDraft) -> RepoResult<User>;

    /// Store every draft or none of them. Emails must be unique within the
    /// batch as well as against stored records.
    async fn insert_all(&self, drafts: Vec<UserDraft>) -> RepoResult<Vec<User>>;

    /// Read, [`merge_patch`] and write back `id` as one atomic step, so a
    /// concurrent patch of other fields is never overwritten. `Ok(None)` when
    /// the id is unknown. `created_at` is never changed.
    async fn apply_patch(
        &self,
        id: i64,
        patch: &UserPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<User>>;

    /// Returns true if a row was deleted.
    async fn delete(&self, id: i64) -> RepoResult<bool>;
}
