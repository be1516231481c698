//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, AppError>`; any [`reg_core::Error`] is
//! converted with `?` and rendered as `{"error", "code", "request_id"}`.
//! The request ID is the one the request-id middleware is serving, if any.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::middleware::request_id;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: reg_core::Error,
}

impl AppError {
    pub fn new(inner: reg_core::Error) -> Self {
        Self { inner }
    }
}

impl From<reg_core::Error> for AppError {
    fn from(e: reg_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        } else {
            tracing::debug!(status = %status, error = %self.inner, "Request rejected");
        }

        let body = json!({
            "error": self.inner.to_string(),
            "code": self.inner.code(),
            "request_id": request_id::current(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(reg_core::Error::not_found("user", 7));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_produces_400() {
        let err = AppError::new(reg_core::Error::Validation("username is required".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn forbidden_produces_403() {
        let err = AppError::new(reg_core::Error::Forbidden("wrong key".into()));
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn body_carries_code() {
        let response = AppError::new(reg_core::Error::Unauthorized("no key".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "unauthorized");
        assert!(json["request_id"].is_null());
    }
}
