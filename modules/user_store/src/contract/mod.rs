pub mod client;
pub mod error;
pub mod model;

pub use model::{
    FieldMetadata, NewUser, StorageInfo, User, UserPatch, UserQuery, DEFAULT_QUERY_LIMIT,
};
