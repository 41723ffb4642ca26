//! services/api/src/adapters/jwt.rs
//!
//! Session tokens as HS256-signed JWTs. Nothing is stored server-side: a token is
//! valid exactly when its signature checks out and it has not expired.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use qa_relay_core::domain::Identity;
use qa_relay_core::ports::{PortError, PortResult, SessionTokenService};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: Uuid,
    email: String,
    iat: i64,
    exp: i64,
}

/// An adapter that implements the `SessionTokenService` port with `jsonwebtoken`.
#[derive(Clone)]
pub struct JwtTokenAdapter {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenAdapter {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }
}

#[async_trait]
impl SessionTokenService for JwtTokenAdapter {
    async fn issue(&self, user_id: Uuid, email: &str) -> PortResult<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| PortError::Unexpected("Token lifetime overflows the clock".to_string()))?;
        let claims = Claims {
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {}", e)))
    }

    async fn verify(&self, token: &str) -> PortResult<Identity> {
        let data = decode::<Claims>(token, &self.decoding_key, &Self::validation()).map_err(|e| {
            warn!("Rejected session token: {}", e);
            PortError::Unauthorized
        })?;

        Ok(Identity {
            user_id: data.claims.user_id,
            email: data.claims.email,
        })
    }
}
