//! services/api/src/web/notify.rs
//!
//! Realtime endpoints: pushing typing/final events to a user, and signing
//! subscriptions to private channels for the relay's client library.

use axum::{extract::State, Extension, Json};
use qa_relay_core::domain::{Channel, Identity};
use qa_relay_core::notify::NotifyCommand;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::{
    extract::{FormBody, JsonBody},
    questions::SuccessResponse,
    state::AppState,
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub user_id: Option<String>,
    /// Partial answer text, published as a `typing` event.
    pub text: Option<String>,
    /// Full answer, published as `final` and mirrored to the admin channel.
    pub answer: Option<String>,
}

/// Form fields posted by the relay's client library when subscribing.
#[derive(Deserialize, ToSchema)]
pub struct SubscriptionAuthRequest {
    pub socket_id: String,
    pub channel_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionAuthResponse {
    pub auth: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/pusher/answer - Publish typing and/or final answer events
#[utoipa::path(
    post,
    path = "/api/pusher/answer",
    request_body = NotifyRequest,
    responses(
        (status = 200, description = "All publishes succeeded", body = SuccessResponse),
        (status = 400, description = "Missing or malformed userId", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an admin"),
        (status = 500, description = "Some publishes failed", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn notify_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    JsonBody(req): JsonBody<NotifyRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.require_admin(&identity)?;

    let raw_user_id = req
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Missing required field: userId".to_string()))?;
    let user_id = Uuid::parse_str(&raw_user_id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid userId '{}'", raw_user_id)))?;

    let report = state
        .notifier
        .notify(NotifyCommand {
            user_id,
            text: req.text,
            answer: req.answer,
        })
        .await;

    if !report.is_complete() {
        return Err(ApiError::Delivery(report.failure_summary()));
    }
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/pusher/auth - Sign a private channel subscription
#[utoipa::path(
    post,
    path = "/api/pusher/auth",
    request_body(content = SubscriptionAuthRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Subscription signed", body = SubscriptionAuthResponse),
        (status = 400, description = "Malformed socket id", body = crate::error::ErrorBody),
        (status = 403, description = "Channel not open to this user", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn subscription_auth_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    FormBody(req): FormBody<SubscriptionAuthRequest>,
) -> Result<Json<SubscriptionAuthResponse>, ApiError> {
    if !is_socket_id(&req.socket_id) {
        return Err(ApiError::BadRequest(format!(
            "Invalid socket_id '{}'",
            req.socket_id
        )));
    }

    let own_channel = Channel::User(identity.user_id).to_string();
    let allowed = req.channel_name == own_channel
        || (req.channel_name == Channel::ADMIN_NAME && state.is_admin(&identity));
    if !allowed {
        warn!(
            "User {} denied subscription to {}",
            identity.user_id, req.channel_name
        );
        return Err(ApiError::Forbidden(format!(
            "Not allowed to subscribe to {}",
            req.channel_name
        )));
    }

    let auth = state
        .relay
        .authorize_subscription(&req.socket_id, &req.channel_name)?;
    Ok(Json(SubscriptionAuthResponse { auth }))
}

/// Socket ids look like `1234.5678`.
fn is_socket_id(raw: &str) -> bool {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    matches!(raw.split_once('.'), Some((a, b)) if all_digits(a) && all_digits(b))
}

#[cfg(test)]
mod tests {
    use super::is_socket_id;
    use rstest::rstest;

    #[rstest]
    #[case("1234.1234", true)]
    #[case("1.2", true)]
    #[case("1234", false)]
    #[case("12a.34", false)]
    #[case(".34", false)]
    #[case("1.2.3", false)]
    fn validates_socket_ids(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(is_socket_id(raw), expected);
    }
}
