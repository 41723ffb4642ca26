//! services/api/src/web/rest.rs
//!
//! Contains the health endpoint and the master definition for the OpenAPI
//! document.

use crate::web::{auth, notify, questions};
use axum::Json;
use serde::Serialize;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::auth_handler,
        questions::list_questions_handler,
        questions::submit_question_handler,
        questions::answer_question_handler,
        notify::notify_handler,
        notify::subscription_auth_handler,
    ),
    components(
        schemas(
            HealthResponse,
            crate::error::ErrorBody,
            auth::AuthRequest,
            auth::AuthResponse,
            auth::AuthUser,
            questions::QuestionView,
            questions::SubmitQuestionRequest,
            questions::AnswerRequest,
            questions::SuccessResponse,
            questions::AnswerResponse,
            notify::NotifyRequest,
            notify::SubscriptionAuthRequest,
            notify::SubscriptionAuthResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Q&A Relay API", description = "Ask questions, answer them, and push answers to the asker in real time.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
