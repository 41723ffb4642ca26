//! services/api/src/web/routes.rs
//!
//! Builds the HTTP router: route table, per-route method fallbacks, CORS,
//! authentication and request tracing.

use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, AUTHORIZATION,
            CONTENT_TYPE,
        },
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::web::{
    auth::auth_handler,
    middleware::require_auth,
    notify::{notify_handler, subscription_auth_handler},
    questions::{answer_question_handler, list_questions_handler, submit_question_handler},
    rest::health_handler,
    state::AppState,
};

/// Answers any method a route does not support.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// The auth endpoint is open to any origin, for POST and OPTIONS only.
///
/// `CorsLayer` answers every OPTIONS request itself with an empty 200.
fn auth_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

fn api_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Builds the API router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route(
            "/api/auth",
            post(auth_handler).fallback(method_not_allowed),
        )
        .layer(auth_cors())
        // Advertised on every response, not only on preflights.
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route(
            "/api/questions",
            get(list_questions_handler)
                .post(submit_question_handler)
                .put(answer_question_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/pusher/answer",
            post(notify_handler).fallback(method_not_allowed),
        )
        .route(
            "/api/pusher/auth",
            post(subscription_auth_handler).fallback(method_not_allowed),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .layer(api_cors());

    Router::new()
        .route("/health", get(health_handler))
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
