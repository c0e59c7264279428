//! In-process repository: one table behind a read/write lock.
//!
//! Every mutation, including a whole batch, runs inside a single write-lock
//! section, so readers never see a half-applied change and the email index
//! cannot drift from the rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::contract::model::{User, UserPatch};
use crate::domain::query::{SortOrder, UserFilter, Window};
use crate::domain::repo::{merge_patch, RepoError, RepoResult, UserDraft, UsersRepository};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, User>,
    by_email: HashMap<String, i64>,
    last_id: i64,
}

impl Table {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn put(&mut self, draft: UserDraft) -> User {
        let id = self.next_id();
        let user = draft.into_user(id);
        self.by_email.insert(user.email.clone(), id);
        self.rows.insert(id, user.clone());
        user
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUsersRepository {
    table: RwLock<Table>,
}

impl InMemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for InMemoryUsersRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> RepoResult<()> {
        let _guard = self.table.read();
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.table.read().rows.get(&id).cloned())
    }

    async fn list_all(&self) -> RepoResult<Vec<User>> {
        Ok(self.table.read().rows.values().cloned().collect())
    }

    async fn find_matching(
        &self,
        filter: &UserFilter,
        order: SortOrder,
        window: Option<Window>,
    ) -> RepoResult<Vec<User>> {
        let mut users: Vec<User> = self
            .table
            .read()
            .rows
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        order.sort(&mut users);
        Ok(match window {
            Some(w) => w.apply(users),
            None => users,
        })
    }

    async fn count_matching(&self, filter: &UserFilter) -> RepoResult<u64> {
        let n = self
            .table
            .read()
            .rows
            .values()
            .filter(|u| filter.matches(u))
            .count();
        Ok(n as u64)
    }

    async fn insert(&self, draft: UserDraft) -> RepoResult<User> {
        let mut table = self.table.write();
        if table.by_email.contains_key(&draft.email) {
            return Err(RepoError::EmailTaken { email: draft.email });
        }
        Ok(table.put(draft))
    }

    async fn insert_all(&self, drafts: Vec<UserDraft>) -> RepoResult<Vec<User>> {
        let mut table = self.table.write();

        {
            let mut seen = HashSet::with_capacity(drafts.len());
            for d in &drafts {
                if table.by_email.contains_key(&d.email) || !seen.insert(d.email.as_str()) {
                    return Err(RepoError::EmailTaken {
                        email: d.email.clone(),
                    });
                }
            }
        }

        Ok(drafts.into_iter().map(|d| table.put(d)).collect())
    }

    async fn apply_patch(
        &self,
        id: i64,
        patch: &UserPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<User>> {
        let mut table = self.table.write();

        let Some(mut user) = table.rows.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(email) = &patch.email {
            if table.by_email.get(email).is_some_and(|&owner| owner != id) {
                return Err(RepoError::EmailTaken {
                    email: email.clone(),
                });
            }
        }

        let old_email = user.email.clone();
        merge_patch(&mut user, patch, now);
        if user.email != old_email {
            table.by_email.remove(&old_email);
            table.by_email.insert(user.email.clone(), id);
        }
        table.rows.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let mut table = self.table.write();
        match table.rows.remove(&id) {
            Some(user) => {
                table.by_email.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str) -> UserDraft {
        let now = Utc::now();
        UserDraft {
            name: name.into(),
            email: email.into(),
            department: "IT".into(),
            role: "Dev".into(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_from_one() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        let b = repo.insert(draft("Bo", "b@x.com")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        assert!(repo.delete(a.id).await.unwrap());
        let b = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let repo = InMemoryUsersRepository::new();
        repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        let err = repo.insert(draft("Other", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, RepoError::EmailTaken { email } if email == "a@x.com"));
        assert_eq!(repo.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn batch_with_internal_duplicate_stores_nothing() {
        let repo = InMemoryUsersRepository::new();
        let err = repo
            .insert_all(vec![
                draft("Ana", "a@x.com"),
                draft("Bo", "b@x.com"),
                draft("Cy", "a@x.com"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::EmailTaken { .. }));
        assert_eq!(repo.count_all().await.unwrap(), 0);

        // the id sequence is untouched
        let u = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        assert_eq!(u.id, 1);
    }

    fn email(addr: &str) -> UserPatch {
        UserPatch {
            email: Some(addr.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn patch_moves_the_email_index() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        let patched = repo
            .apply_patch(a.id, &email("ana@x.com"), Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched.email, "ana@x.com");

        // the old address is free again, the new one is taken
        repo.insert(draft("Other", "a@x.com")).await.unwrap();
        assert!(repo.insert(draft("Dup", "ana@x.com")).await.is_err());
    }

    #[tokio::test]
    async fn patch_rejects_email_of_another_user() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        repo.insert(draft("Bo", "b@x.com")).await.unwrap();
        assert!(matches!(
            repo.apply_patch(a.id, &email("b@x.com"), Utc::now())
                .await
                .unwrap_err(),
            RepoError::EmailTaken { .. }
        ));
        assert_eq!(repo.find_by_id(a.id).await.unwrap().unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn patch_keeping_own_email_is_fine() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        assert!(repo
            .apply_patch(a.id, &email("a@x.com"), Utc::now())
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn patch_of_unknown_id_is_none() {
        let repo = InMemoryUsersRepository::new();
        let out = repo
            .apply_patch(42, &UserPatch::default(), Utc::now())
            .await
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn patch_keeps_created_at_and_other_fields() {
        let repo = InMemoryUsersRepository::new();
        let a = repo.insert(draft("Ana", "a@x.com")).await.unwrap();
        let patch = UserPatch {
            name: Some("Ana Maria".into()),
            ..Default::default()
        };
        repo.apply_patch(a.id, &patch, Utc::now()).await.unwrap();
        let stored = repo.find_by_id(a.id).await.unwrap().unwrap();
        assert_eq!(stored.created_at, a.created_at);
        assert_eq!(stored.name, "Ana Maria");
        assert_eq!(stored.role, "Dev");
        assert!(stored.updated_at > a.updated_at);
    }
}
