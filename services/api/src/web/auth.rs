//! services/api/src/web/auth.rs
//!
//! The authentication endpoint: a single POST that registers or logs a user in,
//! depending on `action`, and answers with a signed session token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use qa_relay_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::{extract::JsonBody, state::AppState};

/// Same message for unknown email and wrong password.
pub const INVALID_CREDENTIALS: &str = "Email or password incorrect";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AuthRequest {
    /// `register` or `login`.
    pub action: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: AuthUser,
    pub token: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth - Register or log in
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = AuthRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields or unknown action", body = crate::error::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::error::ErrorBody)
    )
)]
pub async fn auth_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<AuthRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let present = |field: Option<String>| field.filter(|v| !v.is_empty());
    let (Some(action), Some(email), Some(password)) =
        (present(req.action), present(req.email), present(req.password))
    else {
        return Err(ApiError::BadRequest(
            "Missing required fields: action, email or password".to_string(),
        ));
    };

    match action.as_str() {
        "register" => register(&state, email, password).await,
        "login" => login(&state, email, password).await,
        _ => Err(ApiError::BadRequest(format!("Unknown action '{}'", action))),
    }
}

async fn register(
    state: &AppState,
    email: String,
    password: String,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    // 1. Refuse taken emails
    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(PortError::Conflict("Email already registered".to_string()).into());
    }

    // 2. Hash the password
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))??;

    // 3. Create user in database
    let user = state
        .db
        .create_user_with_email(&email, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create user: {:?}", e);
            ApiError::from(e)
        })?;
    info!("Registered user {}", user.id);

    // 4. Issue the session token
    let token = state.tokens.issue(user.id, &user.email).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered".to_string(),
            user: AuthUser {
                id: user.id,
                email: user.email,
            },
            token,
        }),
    ))
}

async fn login(
    state: &AppState,
    email: String,
    password: String,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let invalid = || ApiError::Unauthorized(INVALID_CREDENTIALS.to_string());

    // 1. Get user by email
    let creds = state.db.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    // 2. Verify password
    let hashed = creds.hashed_password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))??;
    if !valid {
        return Err(invalid());
    }

    // 3. Issue the session token
    let token = state.tokens.issue(creds.id, &creds.email).await?;

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            message: "Login successful".to_string(),
            user: AuthUser {
                id: creds.id,
                email: creds.email,
            },
            token,
        }),
    ))
}

//=========================================================================================
// Password Hashing
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
