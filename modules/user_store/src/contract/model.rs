use chrono::{DateTime, Utc};

/// Default `limit` of a [`UserQuery`].
pub const DEFAULT_QUERY_LIMIT: u32 = 10;

/// Pure user model for inter-module communication (no serde/utoipa)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        department: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            department: department.into(),
            role: role.into(),
        }
    }
}

/// Partial update data for a user. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
}

/// Optional search criteria plus simple offset paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub department: Option<String>,
    pub role: Option<String>,
    pub active: Option<bool>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            department: None,
            role: None,
            active: None,
            limit: DEFAULT_QUERY_LIMIT,
            offset: 0,
        }
    }
}

/// Snapshot of the backing store and the operations served so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    pub backend: String,
    pub location: Option<String>,
    pub user_count: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub queries: u64,
}

/// Static description of one persisted attribute of [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    pub name: &'static str,
    pub type_name: &'static str,
    pub nullable: bool,
    pub unique: bool,
    pub generated: bool,
    pub constraints: Vec<&'static str>,
}
