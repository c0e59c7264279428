//! Static tool table: name, description and handler of every tool reachable
//! at `POST /mcp/{name}`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::api::rest::dto::{
    BatchUsersReq, CreateUserReq, DepartmentArgs, EntityMetadataDto, FieldMetadataDto,
    PaginationReq, SearchUsersReq, StorageInfoDto, UpdateUserReq, UserDto, UserIdArgs,
};
use crate::contract::model::{NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// What a tool produced; `count` is set for list results.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub result: Value,
    pub count: Option<usize>,
}

impl ToolOutput {
    fn value(v: impl Serialize) -> Result<Self, ToolError> {
        Ok(Self {
            result: serde_json::to_value(v)?,
            count: None,
        })
    }

    fn list<T: Serialize>(items: Vec<T>) -> Result<Self, ToolError> {
        let count = items.len();
        Ok(Self {
            result: serde_json::to_value(items)?,
            count: Some(count),
        })
    }
}

#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid arguments: {0}")]
    BadArguments(String),

    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type ToolFuture = Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send>>;
pub type ToolHandler = fn(Arc<Service>, Value) -> ToolFuture;

pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub handler: ToolHandler,
}

impl std::fmt::Debug for ToolDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDef").field("name", &self.name).finish()
    }
}

fn args<T: DeserializeOwned>(v: Value) -> Result<T, ToolError> {
    serde_json::from_value(v).map_err(|e| ToolError::BadArguments(e.to_string()))
}

fn users_dto(users: Vec<User>) -> Vec<UserDto> {
    users.into_iter().map(UserDto::from).collect()
}

fn new_users(reqs: Vec<CreateUserReq>) -> Vec<NewUser> {
    reqs.into_iter().map(NewUser::from).collect()
}

fn test_storage(svc: Arc<Service>, _args: Value) -> ToolFuture {
    Box::pin(async move {
        let message = svc.ping().await?;
        ToolOutput::value(json!({ "reachable": true, "message": message }))
    })
}

fn get_storage_info(svc: Arc<Service>, _args: Value) -> ToolFuture {
    Box::pin(async move {
        let info = svc.storage_info().await?;
        ToolOutput::value(StorageInfoDto::from(info))
    })
}

fn create_user(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let req: CreateUserReq = args(a)?;
        let user = svc.create_user(req.into()).await?;
        ToolOutput::value(UserDto::from(user))
    })
}

fn find_user_by_id(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let UserIdArgs { user_id } = args(a)?;
        let user = svc.find_user_by_id(user_id).await?;
        ToolOutput::value(UserDto::from(user))
    })
}

fn update_user(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let (id, patch) = args::<UpdateUserReq>(a)?.into_parts();
        let user = svc.update_user(id, patch).await?;
        ToolOutput::value(UserDto::from(user))
    })
}

fn delete_user(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let UserIdArgs { user_id } = args(a)?;
        let deleted = svc.delete_user(user_id).await?;
        ToolOutput::value(json!({ "userId": user_id, "deleted": deleted }))
    })
}

fn find_all_users(svc: Arc<Service>, _args: Value) -> ToolFuture {
    Box::pin(async move { ToolOutput::list(users_dto(svc.find_all().await?)) })
}

fn find_users_by_department(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let DepartmentArgs { department } = args(a)?;
        ToolOutput::list(users_dto(svc.find_users_by_department(&department).await?))
    })
}

fn search_users(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let req: SearchUsersReq = args(a)?;
        let query = req.into_query(svc.config().default_page_size);
        ToolOutput::list(users_dto(svc.search_users(query).await?))
    })
}

fn find_users_with_pagination(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let req: PaginationReq = args(a)?;
        let size = req.size.unwrap_or(svc.config().default_page_size);
        let users = svc.find_users_with_pagination(req.page, size).await?;
        ToolOutput::list(users_dto(users))
    })
}

fn transfer_data(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let BatchUsersReq { users } = args(a)?;
        let total = users.len();
        let transferred = svc.transfer_data(new_users(users)).await?;
        ToolOutput::value(json!({ "transferred": transferred, "users": total }))
    })
}

fn batch_insert_users(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let BatchUsersReq { users } = args(a)?;
        let inserted = svc.batch_insert_users(new_users(users)).await?;
        ToolOutput::value(json!({ "inserted": inserted }))
    })
}

fn get_entity_metadata(svc: Arc<Service>, _args: Value) -> ToolFuture {
    Box::pin(async move {
        let fields: Vec<FieldMetadataDto> = svc
            .entity_metadata()
            .into_iter()
            .map(FieldMetadataDto::from)
            .collect();
        ToolOutput::value(EntityMetadataDto {
            entity: "User".to_string(),
            table: "users".to_string(),
            fields,
        })
    })
}

fn execute_count_by_department(svc: Arc<Service>, a: Value) -> ToolFuture {
    Box::pin(async move {
        let DepartmentArgs { department } = args(a)?;
        let count = svc.count_by_department(&department).await?;
        ToolOutput::value(json!({ "department": department, "activeUsers": count }))
    })
}

static TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "test_storage",
        description: "Check that the backing store is reachable",
        handler: test_storage,
    },
    ToolDef {
        name: "get_storage_info",
        description: "Backend name, location, user count and operation counters",
        handler: get_storage_info,
    },
    ToolDef {
        name: "create_user",
        description: "Create a user from name, email, department and role",
        handler: create_user,
    },
    ToolDef {
        name: "find_user_by_id",
        description: "Fetch one user by userId",
        handler: find_user_by_id,
    },
    ToolDef {
        name: "update_user",
        description: "Change the supplied fields of the user with userId",
        handler: update_user,
    },
    ToolDef {
        name: "delete_user",
        description: "Delete the user with userId; reports whether anything was removed",
        handler: delete_user,
    },
    ToolDef {
        name: "find_all_users",
        description: "List every user",
        handler: find_all_users,
    },
    ToolDef {
        name: "find_users_by_department",
        description: "Active users of a department, ordered by name",
        handler: find_users_by_department,
    },
    ToolDef {
        name: "search_users",
        description: "Filter by department, role and active with limit/offset",
        handler: search_users,
    },
    ToolDef {
        name: "find_users_with_pagination",
        description: "Zero-based page of users ordered by id",
        handler: find_users_with_pagination,
    },
    ToolDef {
        name: "transfer_data",
        description: "Insert a list of users atomically",
        handler: transfer_data,
    },
    ToolDef {
        name: "batch_insert_users",
        description: "Insert a list of users atomically and return how many were stored",
        handler: batch_insert_users,
    },
    ToolDef {
        name: "get_entity_metadata",
        description: "Describe the persisted fields of the User entity",
        handler: get_entity_metadata,
    },
    ToolDef {
        name: "execute_count_by_department",
        description: "Count the active users of a department",
        handler: execute_count_by_department,
    },
];

/// Lookup over the static tool table.
#[derive(Debug, Clone, Copy)]
pub struct ToolRegistry {
    tools: &'static [ToolDef],
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ToolRegistry {
    pub const fn builtin() -> Self {
        Self { tools: TOOLS }
    }

    pub fn find(&self, name: &str) -> Option<&'static ToolDef> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static ToolDef> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
