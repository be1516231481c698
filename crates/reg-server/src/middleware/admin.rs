//! Admin gate for mutating requests.
//!
//! Reads are open. When `auth.enabled` is set, every other method must carry
//! `Authorization: Bearer <auth.api_key>`: a missing or malformed header is
//! rejected with 401, a wrong key with 403.

use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use hmac::{Hmac, Mac};
use reg_core::config::AuthConfig;
use reg_core::Error;
use sha2::Sha256;

use crate::context::AppContext;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const KEY_LABEL: &[u8] = b"registrar admin key";

/// Compare two API keys in constant time.
///
/// Both sides go through HMAC-SHA256 so the comparison runs over
/// fixed-length tags regardless of the presented key's length.
fn keys_match(expected: &str, presented: &str) -> bool {
    let tag = |key: &str| -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(KEY_LABEL).ok()?;
        mac.update(key.as_bytes());
        Some(mac)
    };
    let (Some(expected), Some(presented)) = (tag(expected), tag(presented)) else {
        return false;
    };
    presented
        .verify_slice(&expected.finalize().into_bytes())
        .is_ok()
}

fn is_read(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Decide whether a request with `method` and `authorization` may proceed.
pub fn check_admin(
    auth: &AuthConfig,
    method: &Method,
    authorization: Option<&str>,
) -> Result<(), Error> {
    if !auth.enabled || is_read(method) {
        return Ok(());
    }

    let token = authorization
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::Unauthorized("admin API key required".into()))?;

    match auth.api_key.as_deref() {
        Some(key) if keys_match(key, token) => Ok(()),
        _ => Err(Error::Forbidden("API key does not grant admin access".into())),
    }
}

/// Middleware form of [`check_admin`].
pub async fn admin_middleware(
    State(ctx): State<AppContext>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match check_admin(&ctx.config.auth, request.method(), authorization) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::warn!(method = %request.method(), path = %request.uri().path(), "{e}");
            AppError::new(e).into_response()
        }
    }
}
