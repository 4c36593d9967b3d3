//! Maps every [`ApiError`] kind to a transport status and a
//! `{"code": …, "detail": …}` body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::errors::ApiError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub detail: String,
}

pub fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
        ApiError::PermissionScope(_) => StatusCode::FORBIDDEN,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
        ApiError::Client(_) | ApiError::UpdateForbidden(_) => StatusCode::BAD_REQUEST,
        ApiError::FilterSyntax(_) | ApiError::NotInitialized(_) | ApiError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            // includes filter-syntax defects, which must fail loudly
            error!(code = self.code(), error = %self, "request failed");
        }
        let body = ErrorBody {
            code: self.code(),
            detail: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::Authentication("x".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::PermissionScope("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (ApiError::Client("x".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::UpdateForbidden("x".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::FilterSyntax("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::NotInitialized("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }
}
