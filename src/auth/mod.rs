//! Shared-secret gate for write routes.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Gate layer function that takes the expected key as a parameter.
pub async fn api_key_layer(expected_key: Option<String>, request: Request, next: Next) -> Response {
    // If no key is configured, allow all requests (dev mode)
    let Some(expected) = expected_key else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match authorize(&expected, presented) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(
                "Rejected {} {}: {}",
                request.method(),
                request.uri().path(),
                err.message()
            );
            err.into_response()
        }
    }
}

/// Succeeds iff `presented` equals the configured secret exactly.
pub fn authorize(expected: &str, presented: Option<&str>) -> Result<(), AppError> {
    match presented {
        Some(key) if constant_time_compare(key, expected) => Ok(()),
        Some(_) => Err(AppError::Forbidden("Invalid API key".to_string())),
        None => Err(AppError::Forbidden("Missing API key".to_string())),
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
