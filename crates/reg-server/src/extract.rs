//! Request extractors that report bad input in the API's error format.
//!
//! axum's own `Json` and `Query` reject with a plain-text body. These
//! wrappers turn every rejection into [`reg_core::Error::Validation`] so the
//! client gets a 400 with `{"error", "code", "request_id"}` like any other
//! validation failure.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(reject(rejection.body_text())),
        }
    }
}

/// Query-string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(reject(rejection.body_text())),
        }
    }
}

fn reject(message: String) -> AppError {
    tracing::debug!(%message, "Malformed request");
    AppError::new(reg_core::Error::Validation(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        name: String,
    }

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn missing_field_is_validation_error() {
        let err = ValidJson::<Payload>::from_request(json_request("{}"), &())
            .await
            .unwrap_err();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
        assert!(body["error"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn malformed_json_is_validation_error() {
        let err = ValidJson::<Payload>::from_request(json_request("{\"name\":"), &())
            .await
            .unwrap_err();
        let (status, _) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn well_formed_body_passes_through() {
        let ValidJson(payload) =
            ValidJson::<Payload>::from_request(json_request("{\"name\":\"x\"}"), &())
                .await
                .unwrap();
        assert_eq!(payload.name, "x");
    }

    #[tokio::test]
    async fn bad_query_value_is_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Params {
            #[allow(dead_code)]
            year: Option<i64>,
        }
        let (mut parts, _) = Request::builder()
            .uri("/?year=abc")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let err = ValidQuery::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation_error");
    }
}
