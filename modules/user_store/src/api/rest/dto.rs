use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{FieldMetadata, NewUser, StorageInfo, User, UserPatch, UserQuery};

/// REST DTO for user representation with serde/utoipa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Arguments of `create_user`; also one element of a batch.
///
/// Missing fields deserialize as empty strings so validation can report
/// all of them at once.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserReq {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
}

/// Arguments of `update_user`: the target id plus the fields to change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserReq {
    pub user_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdArgs {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DepartmentArgs {
    pub department: String,
}

/// Arguments of `search_users`. Absent criteria match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchUsersReq {
    pub department: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Zero-based page request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationReq {
    pub page: u32,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchUsersReq {
    pub users: Vec<CreateUserReq>,
}

/// Envelope of every successful tool call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolResponse {
    pub tool: String,
    pub status: String,
    #[schema(value_type = Object)]
    pub result: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolInfoDto {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolListDto {
    pub tools: Vec<ToolInfoDto>,
    pub count: usize,
    pub server: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDto {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfoDto {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub user_count: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub queries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldMetadataDto {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub nullable: bool,
    pub unique: bool,
    pub generated: bool,
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntityMetadataDto {
    pub entity: String,
    pub table: String,
    pub fields: Vec<FieldMetadataDto>,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            department: user.department,
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            department: req.department,
            role: req.role,
        }
    }
}

impl UpdateUserReq {
    pub fn into_parts(self) -> (i64, UserPatch) {
        (
            self.user_id,
            UserPatch {
                name: self.name,
                email: self.email,
                department: self.department,
                role: self.role,
                active: self.active,
            },
        )
    }
}

impl SearchUsersReq {
    pub fn into_query(self, default_limit: u32) -> UserQuery {
        UserQuery {
            department: self.department,
            role: self.role,
            active: self.active,
            limit: self.limit.unwrap_or(default_limit),
            offset: self.offset.unwrap_or(0),
        }
    }
}

impl From<StorageInfo> for StorageInfoDto {
    fn from(info: StorageInfo) -> Self {
        Self {
            backend: info.backend,
            location: info.location,
            user_count: info.user_count,
            inserts: info.inserts,
            updates: info.updates,
            deletes: info.deletes,
            queries: info.queries,
        }
    }
}

impl From<FieldMetadata> for FieldMetadataDto {
    fn from(f: FieldMetadata) -> Self {
        Self {
            name: f.name.to_string(),
            type_name: f.type_name.to_string(),
            nullable: f.nullable,
            unique: f.unique,
            generated: f.generated,
            constraints: f.constraints.into_iter().map(str::to_string).collect(),
        }
    }
}
