//! Field checks applied before a user is admitted to or amended in the store.
//!
//! Every check runs; callers get the full list of violations instead of the
//! first one.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::model::{NewUser, UserPatch};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;

pub const MSG_NAME_REQUIRED: &str = "name is required";
pub const MSG_NAME_LENGTH: &str = "name must be between 2 and 50 characters";
pub const MSG_EMAIL_REQUIRED: &str = "email is required";
pub const MSG_EMAIL_FORMAT: &str = "email must be a valid address";
pub const MSG_DEPARTMENT_REQUIRED: &str = "department is required";
pub const MSG_ROLE_REQUIRED: &str = "role is required";

// local@label(.label)*, no whitespace, exactly one '@'
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)*$").expect("email regex"));

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every violation found for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Move `other` in, renaming each field to `<prefix>.<field>`.
    pub fn merge_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for v in other.violations {
            self.violations.push(FieldViolation {
                field: format!("{prefix}.{}", v.field),
                message: v.message,
            });
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        for (i, v) in self.violations.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    if is_blank(name) {
        errors.push("name", MSG_NAME_REQUIRED);
    }
    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        errors.push("name", MSG_NAME_LENGTH);
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if is_blank(email) {
        errors.push("email", MSG_EMAIL_REQUIRED);
    } else if !is_valid_email(email) {
        errors.push("email", MSG_EMAIL_FORMAT);
    }
}

fn check_required(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) {
    if is_blank(value) {
        errors.push(field, message);
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// All creation rules.
pub fn validate_new_user(new_user: &NewUser) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_name(&mut errors, &new_user.name);
    check_email(&mut errors, &new_user.email);
    check_required(
        &mut errors,
        "department",
        &new_user.department,
        MSG_DEPARTMENT_REQUIRED,
    );
    check_required(&mut errors, "role", &new_user.role, MSG_ROLE_REQUIRED);
    errors.into_result()
}

/// Creation rules, applied only to the fields the patch supplies.
pub fn validate_patch(patch: &UserPatch) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Some(name) = &patch.name {
        check_name(&mut errors, name);
    }
    if let Some(email) = &patch.email {
        check_email(&mut errors, email);
    }
    if let Some(department) = &patch.department {
        check_required(&mut errors, "department", department, MSG_DEPARTMENT_REQUIRED);
    }
    if let Some(role) = &patch.role {
        check_required(&mut errors, "role", role, MSG_ROLE_REQUIRED);
    }
    errors.into_result()
}

/// Validate every element of a batch, reporting fields as `users[i].field`.
pub fn validate_batch(users: &[NewUser]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for (i, u) in users.iter().enumerate() {
        if let Err(e) = validate_new_user(u) {
            errors.merge_prefixed(&format!("users[{i}]"), e);
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewUser {
        NewUser::new("Ana García", "ana@x.com", "IT", "Developer")
    }

    #[test]
    fn accepts_valid_user() {
        assert!(validate_new_user(&valid()).is_ok());
    }

    #[test]
    fn single_char_name_is_too_short() {
        let u = NewUser {
            name: "A".into(),
            ..valid()
        };
        let errs = validate_new_user(&u).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.violations()[0].field, "name");
        assert_eq!(errs.violations()[0].message, MSG_NAME_LENGTH);
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let fifty = "ñ".repeat(50);
        let u = NewUser {
            name: fifty,
            ..valid()
        };
        assert!(validate_new_user(&u).is_ok());

        let u = NewUser {
            name: "ñ".repeat(51),
            ..valid()
        };
        assert!(validate_new_user(&u).unwrap_err().has_field("name"));
    }

    #[test]
    fn blank_name_reports_both_rules() {
        let u = NewUser {
            name: "".into(),
            ..valid()
        };
        let errs = validate_new_user(&u).unwrap_err();
        let messages: Vec<_> = errs.violations().iter().map(|v| v.message.as_str()).collect();
        assert_eq!(messages, vec![MSG_NAME_REQUIRED, MSG_NAME_LENGTH]);
    }

    #[test]
    fn whitespace_name_of_valid_length_is_blank() {
        let u = NewUser {
            name: "   ".into(),
            ..valid()
        };
        let errs = validate_new_user(&u).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.violations()[0].message, MSG_NAME_REQUIRED);
    }

    #[test]
    fn reports_all_violations() {
        let u = NewUser::new("", "not-an-email", " ", "");
        let errs = validate_new_user(&u).unwrap_err();
        assert!(errs.has_field("name"));
        assert!(errs.has_field("email"));
        assert!(errs.has_field("department"));
        assert!(errs.has_field("role"));
        assert_eq!(errs.len(), 5);
    }

    #[test]
    fn email_shapes() {
        for ok in ["a@b", "ana@x.com", "first.last@mail.example.org", "a+b@c.io"] {
            assert!(is_valid_email(ok), "{ok} should be valid");
        }
        for bad in [
            "plain",
            "@x.com",
            "ana@",
            "ana@@x.com",
            "a@b@c.com",
            "ana @x.com",
            "ana@x..com",
            "ana@.com",
            "ana@x.com.",
        ] {
            assert!(!is_valid_email(bad), "{bad} should be invalid");
        }
    }

    #[test]
    fn blank_email_only_reports_required() {
        let u = NewUser {
            email: "  ".into(),
            ..valid()
        };
        let errs = validate_new_user(&u).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.violations()[0].message, MSG_EMAIL_REQUIRED);
    }

    #[test]
    fn patch_checks_only_supplied_fields() {
        assert!(validate_patch(&UserPatch::default()).is_ok());

        let patch = UserPatch {
            active: Some(false),
            role: Some("Lead".into()),
            ..Default::default()
        };
        assert!(validate_patch(&patch).is_ok());

        let patch = UserPatch {
            department: Some("".into()),
            email: Some("nope".into()),
            ..Default::default()
        };
        let errs = validate_patch(&patch).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.has_field("email"));
        assert!(errs.has_field("department"));
    }

    #[test]
    fn batch_paths_carry_index() {
        let users = vec![valid(), NewUser::new("B", "b@x.com", "IT", "Dev")];
        let errs = validate_batch(&users).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.violations()[0].field, "users[1].name");
    }

    #[test]
    fn display_lists_every_violation() {
        let mut errs = ValidationErrors::default();
        errs.push("name", "bad");
        errs.push("role", "missing");
        assert_eq!(
            errs.to_string(),
            "validation failed: name: bad; role: missing"
        );
    }
}
