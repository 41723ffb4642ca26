//! services/api/src/web/questions.rs
//!
//! Question endpoints: list the open questions, submit a new one, and record an
//! answer. Recording an answer pushes it to the asking user in the same request.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use qa_relay_core::domain::{Identity, NewQuestion, Question};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::{
    extract::{ClientIp, JsonBody},
    state::AppState,
};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// A question as returned by the listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QuestionView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub content: String,
    pub ip: Option<String>,
    pub answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Question> for QuestionView {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            user_id: q.user_id,
            email: q.email,
            content: q.content,
            ip: q.ip,
            answer: q.answer,
            created_at: q.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SubmitQuestionRequest {
    pub question: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub answer: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnswerQuery {
    /// The id of the question being answered.
    pub id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, ToSchema)]
pub struct AnswerResponse {
    pub success: bool,
    /// False when the answer was saved but not every realtime publish went through.
    pub notified: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/questions - List unanswered questions, newest first
#[utoipa::path(
    get,
    path = "/api/questions",
    responses(
        (status = 200, description = "Unanswered questions", body = [QuestionView]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 500, description = "The store could not be queried", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_questions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<QuestionView>>, ApiError> {
    state.require_admin(&identity)?;

    let questions = state.db.list_unanswered_questions().await?;
    Ok(Json(questions.into_iter().map(QuestionView::from).collect()))
}

/// POST /api/questions - Submit a question as the authenticated user
#[utoipa::path(
    post,
    path = "/api/questions",
    request_body = SubmitQuestionRequest,
    responses(
        (status = 201, description = "Question stored", body = SuccessResponse),
        (status = 400, description = "Missing question text", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer" = []))
)]
pub async fn submit_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ClientIp(ip): ClientIp,
    JsonBody(req): JsonBody<SubmitQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: question".to_string()))?;

    let question = state
        .db
        .create_question(NewQuestion {
            user_id: identity.user_id,
            email: identity.email,
            content,
            ip,
        })
        .await?;
    info!("Question {} submitted by user {}", question.id, question.user_id);

    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

/// PUT /api/questions?id= - Record the answer and push it to the asking user
#[utoipa::path(
    put,
    path = "/api/questions",
    params(AnswerQuery),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer stored", body = AnswerResponse),
        (status = 400, description = "Missing or malformed id or answer", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Unknown question", body = crate::error::ErrorBody),
        (status = 409, description = "Question already answered", body = crate::error::ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn answer_question_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<AnswerQuery>,
    JsonBody(req): JsonBody<AnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    state.require_admin(&identity)?;

    let question_id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("Missing query parameter: id".to_string()))
        .and_then(|raw| {
            Uuid::parse_str(&raw)
                .map_err(|_| ApiError::BadRequest(format!("Invalid question id '{}'", raw)))
        })?;
    let answer = req
        .answer
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field: answer".to_string()))?;

    // 1. Commit the answer; the owner comes back with the updated row
    let question = state.db.answer_question(question_id, &answer).await?;
    info!("Question {} answered by {}", question.id, identity.email);

    // 2. Push it to the owner and mirror it to admins
    let report = state.notifier.deliver_answer(question.user_id, &answer).await;
    if !report.is_complete() {
        warn!(
            "Answer for question {} saved but delivery degraded: {}",
            question.id,
            report.failure_summary()
        );
    }

    Ok(Json(AnswerResponse {
        success: true,
        notified: report.is_complete(),
    }))
}
