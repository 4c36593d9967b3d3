//! Error taxonomy shared by the repository, service, and transport layers.
//!
//! Every failure a handler can surface is one of these kinds; the HTTP layer
//! maps each kind to a status code in `routes::error`. Driver errors pass
//! through unchanged behind the `Database` variant — the repository performs
//! exactly one translation step (unique violations on create become
//! `AlreadyExists`) and otherwise never wraps or retries.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// An operation was attempted before `initialize` or after `close`.
    #[error("not_initialized: {0}")]
    NotInitialized(String),

    /// A `get` matched zero rows.
    #[error("not_found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated, or a lookup that must identify
    /// at most one row matched several.
    #[error("already_exists: {0}")]
    AlreadyExists(String),

    /// A domain precondition failed (e.g. updating a settled bet).
    #[error("client_error: {0}")]
    Client(String),

    #[error("update_forbidden: {0}")]
    UpdateForbidden(String),

    #[error("permission_scope_error: {0}")]
    PermissionScope(String),

    #[error("authentication_error: {0}")]
    Authentication(String),

    /// An internally-constructed filter referenced an unknown column or
    /// operator token. Never caused by external input; fails loudly.
    #[error("filter_syntax_error: {0}")]
    FilterSyntax(String),

    #[error("database_error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotInitialized(_) => "not_initialized",
            ApiError::NotFound(_) => "not_found",
            ApiError::AlreadyExists(_) => "already_exists",
            ApiError::Client(_) => "client_error",
            ApiError::UpdateForbidden(_) => "update_forbidden",
            ApiError::PermissionScope(_) => "permission_scope_error",
            ApiError::Authentication(_) => "authentication_error",
            ApiError::FilterSyntax(_) => "filter_syntax_error",
            ApiError::Database(_) => "database_error",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::NotInitialized(detail)
            | ApiError::NotFound(detail)
            | ApiError::AlreadyExists(detail)
            | ApiError::Client(detail)
            | ApiError::UpdateForbidden(detail)
            | ApiError::PermissionScope(detail)
            | ApiError::Authentication(detail)
            | ApiError::FilterSyntax(detail) => detail.clone(),
            ApiError::Database(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_detail() {
        let err = ApiError::NotFound("Bet with filters {id: 1} not found".to_string());
        assert_eq!(err.code(), "not_found");
        assert_eq!(
            err.to_string(),
            "not_found: Bet with filters {id: 1} not found"
        );
    }
}
