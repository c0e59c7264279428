use thiserror::Error;

/// Errors that are safe to expose to other crates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UserStoreError {
    #[error("User not found: {id}")]
    NotFound { id: i64 },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        /// `(field, message)` for every violated constraint
        fields: Vec<(String, String)>,
    },

    #[error("Internal error")]
    Internal,
}

impl UserStoreError {
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(email: impl Into<String>) -> Self {
        Self::Conflict {
            email: email.into(),
        }
    }

    pub fn validation(message: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for UserStoreError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            UserNotFound { id } => Self::not_found(id),
            EmailAlreadyExists { email } => Self::conflict(email),
            Validation(errors) => {
                let fields = errors
                    .violations()
                    .iter()
                    .map(|v| (v.field.clone(), v.message.clone()))
                    .collect();
                Self::validation(errors.to_string(), fields)
            }
            Database { .. } => Self::internal(),
        }
    }
}
