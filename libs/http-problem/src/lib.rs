//! RFC 9457 problem documents built from a static error catalog.
use axum::http::StatusCode;

mod problem;

pub use problem::{FieldError, Problem, ProblemResponse, APPLICATION_PROBLEM_JSON};

/// Catalog entry: one per stable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub code: &'static str,
    pub title: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    pub const fn new(
        status: u16,
        code: &'static str,
        title: &'static str,
        type_url: &'static str,
    ) -> Self {
        Self {
            status,
            code,
            title,
            type_url,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// A problem for this entry with an occurrence-specific `detail`.
    pub fn problem(&self, detail: impl Into<String>) -> Problem {
        Problem {
            type_url: self.type_url.to_owned(),
            title: self.title.to_owned(),
            status: self.status,
            detail: detail.into(),
            instance: String::new(),
            code: self.code.to_owned(),
            request_id: None,
            errors: Vec::new(),
        }
    }
}
