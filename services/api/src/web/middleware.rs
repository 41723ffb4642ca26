//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that verifies the bearer session token and extracts the caller's identity.
///
/// If valid, inserts the `Identity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    // 2. Verify signature and expiry
    let identity = state
        .tokens
        .verify(token)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    debug!("Authenticated request for user {}", identity.user_id);

    // 3. Insert the identity into request extensions
    req.extensions_mut().insert(identity);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::bearer_token;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer abc.def", Some("abc.def"))]
    #[case("bearer   abc.def ", Some("abc.def"))]
    #[case("Basic abc", None)]
    #[case("Bearer ", None)]
    #[case("abc.def", None)]
    fn parses_bearer_scheme(#[case] header: &str, #[case] expected: Option<&str>) {
        assert_eq!(bearer_token(header), expected);
    }
}
