use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::handlers::not_found;
use crate::share_manager::ShareManagerError;

/// Only the outcome kinds are visible to callers; anything internal is
///  logged and reported generically.
impl IntoResponse for ShareManagerError {
    fn into_response(self) -> Response {
        match self {
            ShareManagerError::NotFound => not_found(),
            ShareManagerError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ShareManagerError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "display name not set").into_response()
            }
            ShareManagerError::RateLimited { retry_after } => {
                let secs = retry_after
                    .as_secs()
                    .saturating_add(u64::from(retry_after.subsec_nanos() > 0))
                    .max(1);
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                response
            }
            ShareManagerError::CreationFailed => {
                (StatusCode::INTERNAL_SERVER_ERROR, "creation failed").into_response()
            }
            err @ (ShareManagerError::Database(_)
            | ShareManagerError::Uploads(_)
            | ShareManagerError::RandomSource(_)) => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}
