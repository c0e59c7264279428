//! SeaORM-backed repository implementation for the domain port.
//!
//! This struct is generic over `C: ConnectionTrait + TransactionTrait`, so you
//! can construct it with a `DatabaseConnection` or anything else that can open
//! a transaction. Batch inserts and patches always run inside one.

use anyhow::Context;
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, DbErr, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::contract::model::{User, UserPatch, UserQuery};
use crate::domain::query::{Criterion, SortOrder, UserFilter, Window};
use crate::domain::repo::{merge_patch, RepoError, RepoResult, UserDraft, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};
use crate::infra::storage::migrations::Migrator;

impl UserFilter {
    /// The same conjunction as [`UserFilter::matches`], as a SQL condition.
    pub fn to_condition(&self) -> Condition {
        self.criteria()
            .iter()
            .fold(Condition::all(), |cond, criterion| match criterion {
                Criterion::Department(d) => cond.add(Column::Department.eq(d.as_str())),
                Criterion::Role(r) => cond.add(Column::Role.eq(r.as_str())),
                Criterion::Active(a) => cond.add(Column::Active.eq(*a)),
            })
    }
}

impl UserQuery {
    pub fn to_condition(&self) -> Condition {
        self.filter().to_condition()
    }
}

fn draft_to_active(draft: UserDraft) -> UserAM {
    UserAM {
        id: NotSet,
        name: Set(draft.name),
        email: Set(draft.email),
        department: Set(draft.department),
        role: Set(draft.role),
        active: Set(draft.active),
        created_at: Set(draft.created_at),
        updated_at: Set(draft.updated_at),
    }
}

/// Unique violations can only come from the email index.
fn write_error(e: DbErr, email: &str, what: &'static str) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => RepoError::EmailTaken {
            email: email.to_owned(),
        },
        _ => RepoError::Storage(anyhow::Error::new(e).context(what)),
    }
}

/// Open `url` and bring the schema up to date.
///
/// In-memory SQLite lives only as long as a pooled connection does, so the
/// pool keeps one open.
pub async fn connect(url: &str) -> anyhow::Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(url.to_owned());
    if url.contains(":memory:") || url.contains("mode=memory") {
        opts.min_connections(1);
    }
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    Migrator::up(&db, None)
        .await
        .context("failed to run user store migrations")?;
    info!(url, "user store schema is up to date");
    Ok(db)
}

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
    location: Option<String>,
    // serializes read-merge-write patches issued through this repository
    patch_gate: Mutex<()>,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            location: None,
            patch_gate: Mutex::new(()),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl SeaOrmUsersRepository<DatabaseConnection> {
    /// Connect, migrate and remember `url` as the reported location.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let db = connect(url).await?;
        Ok(Self::new(db).with_location(url))
    }
}

#[async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn location(&self) -> Option<String> {
        self.location.clone()
    }

    async fn ping(&self) -> RepoResult<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .context("ping failed")?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn list_all(&self) -> RepoResult<Vec<User>> {
        let rows = UserEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_matching(
        &self,
        filter: &UserFilter,
        order: SortOrder,
        window: Option<Window>,
    ) -> RepoResult<Vec<User>> {
        let mut select = UserEntity::find().filter(filter.to_condition());
        select = match order {
            SortOrder::ById => select.order_by_asc(Column::Id),
            SortOrder::ByName => select.order_by_asc(Column::Name).order_by_asc(Column::Id),
        };
        if let Some(w) = window {
            select = select.offset(w.offset).limit(w.limit);
        }
        let rows = select
            .all(&self.conn)
            .await
            .context("find_matching failed")?;
        debug!(rows = rows.len(), "query executed");
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_matching(&self, filter: &UserFilter) -> RepoResult<u64> {
        let n = UserEntity::find()
            .filter(filter.to_condition())
            .count(&self.conn)
            .await
            .context("count_matching failed")?;
        Ok(n)
    }

    async fn insert(&self, draft: UserDraft) -> RepoResult<User> {
        let email = draft.email.clone();
        let model = draft_to_active(draft)
            .insert(&self.conn)
            .await
            .map_err(|e| write_error(e, &email, "insert failed"))?;
        Ok(model.into())
    }

    async fn insert_all(&self, drafts: Vec<UserDraft>) -> RepoResult<Vec<User>> {
        let txn = self
            .conn
            .begin()
            .await
            .context("failed to begin transaction")?;

        let mut stored = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let email = draft.email.clone();
            // an early return drops `txn`, which rolls it back
            let model = draft_to_active(draft)
                .insert(&txn)
                .await
                .map_err(|e| write_error(e, &email, "batch insert failed"))?;
            stored.push(User::from(model));
        }

        txn.commit()
            .await
            .context("failed to commit batch insert")?;
        Ok(stored)
    }

    async fn apply_patch(
        &self,
        id: i64,
        patch: &UserPatch,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<User>> {
        let _gate = self.patch_gate.lock().await;
        let txn = self
            .conn
            .begin()
            .await
            .context("failed to begin transaction")?;

        let Some(model) = UserEntity::find_by_id(id)
            .one(&txn)
            .await
            .context("patch lookup failed")?
        else {
            return Ok(None);
        };
        let mut user = User::from(model);
        merge_patch(&mut user, patch, now);

        // only the supplied columns are written
        let mut update = UserEntity::update_many();
        if let Some(name) = &patch.name {
            update = update.col_expr(Column::Name, Expr::value(name.clone()));
        }
        if let Some(email) = &patch.email {
            update = update.col_expr(Column::Email, Expr::value(email.clone()));
        }
        if let Some(department) = &patch.department {
            update = update.col_expr(Column::Department, Expr::value(department.clone()));
        }
        if let Some(role) = &patch.role {
            update = update.col_expr(Column::Role, Expr::value(role.clone()));
        }
        if let Some(active) = patch.active {
            update = update.col_expr(Column::Active, Expr::value(active));
        }
        let res = update
            .col_expr(Column::UpdatedAt, Expr::value(user.updated_at))
            .filter(Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| write_error(e, &user.email, "patch failed"))?;
        if res.rows_affected == 0 {
            return Ok(None);
        }

        txn.commit().await.context("failed to commit patch")?;
        Ok(Some(user))
    }

    async fn delete(&self, id: i64) -> RepoResult<bool> {
        let res = UserEntity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }
}
