use http_problem::{ErrDef, FieldError, ProblemResponse};

use crate::api::rest::tools::ToolError;
use crate::domain::error::DomainError;
use crate::domain::validation::ValidationErrors;

pub const USERS_VALIDATION: ErrDef = ErrDef::new(
    400,
    "USERS_VALIDATION",
    "Validation error",
    "https://errors.example.com/USERS_VALIDATION",
);
pub const USERS_NOT_FOUND: ErrDef = ErrDef::new(
    404,
    "USERS_NOT_FOUND",
    "User not found",
    "https://errors.example.com/USERS_NOT_FOUND",
);
pub const USERS_EMAIL_CONFLICT: ErrDef = ErrDef::new(
    409,
    "USERS_EMAIL_CONFLICT",
    "Email already exists",
    "https://errors.example.com/USERS_EMAIL_CONFLICT",
);
pub const INTERNAL_DB: ErrDef = ErrDef::new(
    500,
    "INTERNAL_DB",
    "Internal error",
    "https://errors.example.com/INTERNAL_DB",
);
pub const TOOLS_UNKNOWN: ErrDef = ErrDef::new(
    404,
    "TOOLS_UNKNOWN",
    "Unknown tool",
    "https://errors.example.com/TOOLS_UNKNOWN",
);
pub const TOOLS_BAD_ARGUMENTS: ErrDef = ErrDef::new(
    400,
    "TOOLS_BAD_ARGUMENTS",
    "Invalid tool arguments",
    "https://errors.example.com/TOOLS_BAD_ARGUMENTS",
);
pub const INTERNAL: ErrDef = ErrDef::new(
    500,
    "INTERNAL",
    "Internal error",
    "https://errors.example.com/INTERNAL",
);

/// `users[0].email` -> `/users/0/email`
pub fn field_pointer(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 1);
    for segment in field.split('.') {
        match segment.split_once('[') {
            Some((name, rest)) => {
                out.push('/');
                out.push_str(name);
                for idx in rest.split('[') {
                    out.push('/');
                    out.push_str(idx.trim_end_matches(']'));
                }
            }
            None => {
                out.push('/');
                out.push_str(segment);
            }
        }
    }
    out
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .violations()
        .iter()
        .map(|v| FieldError {
            pointer: field_pointer(&v.field),
            message: v.message.clone(),
        })
        .collect()
}

/// Helper to create a ProblemResponse with less boilerplate
pub fn from_def(
    def: &ErrDef,
    detail: impl Into<String>,
    instance: &str,
    request_id: Option<&str>,
) -> ProblemResponse {
    ProblemResponse(def.problem(detail).at(instance).for_request(request_id))
}

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str, request_id: Option<&str>) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => from_def(
            &USERS_NOT_FOUND,
            format!("User with id {id} was not found"),
            instance,
            request_id,
        ),
        DomainError::EmailAlreadyExists { email } => from_def(
            &USERS_EMAIL_CONFLICT,
            format!("Email '{email}' is already in use"),
            instance,
            request_id,
        ),
        DomainError::Validation(errors) => {
            let mut resp = from_def(&USERS_VALIDATION, errors.to_string(), instance, request_id);
            resp.0 = resp.0.with_field_errors(field_errors(errors));
            resp
        }
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_def(
                &INTERNAL_DB,
                "An internal database error occurred",
                instance,
                request_id,
            )
        }
    }
}

pub fn map_tool_error(e: &ToolError, instance: &str, request_id: Option<&str>) -> ProblemResponse {
    match e {
        ToolError::Domain(d) => map_domain_error(d, instance, request_id),
        ToolError::BadArguments(msg) => from_def(&TOOLS_BAD_ARGUMENTS, msg.clone(), instance, request_id),
        ToolError::Encode(_) => {
            tracing::error!(error = ?e, "Failed to encode tool result");
            from_def(&INTERNAL, "Failed to encode the tool result", instance, request_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointers_follow_json_pointer_shape() {
        assert_eq!(field_pointer("name"), "/name");
        assert_eq!(field_pointer("users[0].email"), "/users/0/email");
        assert_eq!(field_pointer("users[12].name"), "/users/12/name");
    }

    #[test]
    fn validation_problem_lists_fields() {
        let mut errors = ValidationErrors::default();
        errors.push("name", "name is required");
        errors.push("users[1].email", "email is required");
        let resp = map_domain_error(&DomainError::Validation(errors), "/mcp/create_user", Some("rid-1"));
        let p = resp.0;
        assert_eq!(p.status, 400);
        assert_eq!(p.code, "USERS_VALIDATION");
        assert_eq!(p.instance, "/mcp/create_user");
        assert_eq!(p.request_id.as_deref(), Some("rid-1"));
        assert_eq!(p.errors.len(), 2);
        assert_eq!(p.errors[1].pointer, "/users/1/email");
    }

    #[test]
    fn storage_details_stay_internal() {
        let p = map_domain_error(&DomainError::database("disk on fire"), "/mcp/x", None).0;
        assert_eq!(p.status, 500);
        assert_eq!(p.code, "INTERNAL_DB");
        assert!(!p.detail.contains("disk"));
    }

    #[test]
    fn bad_arguments_are_400() {
        let p = map_tool_error(&ToolError::BadArguments("missing field `userId`".into()), "/mcp/x", None).0;
        assert_eq!(p.status, 400);
        assert_eq!(p.code, "TOOLS_BAD_ARGUMENTS");
    }
}
