//! services/api/src/adapters/pusher.rs
//!
//! This module contains the adapter for the hosted pub/sub relay (Pusher Channels).
//! It implements the `RealtimeRelay` port from the `core` crate by calling the
//! relay's signed HTTP events API with `reqwest`.

use crate::config::RelayConfig;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use md5::Md5;
use qa_relay_core::domain::{EventPayload, NotificationEvent};
use qa_relay_core::ports::{PortError, PortResult, RealtimeRelay};
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error};

type HmacSha256 = Hmac<Sha256>;

const AUTH_VERSION: &str = "1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `RealtimeRelay` port using the Pusher HTTP API.
#[derive(Clone)]
pub struct PusherAdapter {
    client: Client,
    config: RelayConfig,
}

/// A fully signed publish, ready to send.
#[derive(Debug)]
struct SignedRequest {
    url: String,
    body: String,
}

impl PusherAdapter {
    /// Creates a new `PusherAdapter`.
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn events_path(&self) -> String {
        format!("/apps/{}/events", self.config.app_id)
    }

    fn hmac_hex(&self, message: &str) -> PortResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.config.secret.as_bytes())
            .map_err(|e| PortError::Unexpected(format!("Invalid relay secret: {}", e)))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Builds the body and the signed URL for one event at the given unix time.
    fn sign_publish(&self, event: &NotificationEvent, timestamp: i64) -> PortResult<SignedRequest> {
        let body = json!({
            "name": event.name(),
            "channels": [event.channel.to_string()],
            "data": wire_payload(&event.payload).to_string(),
        })
        .to_string();

        let mut params = BTreeMap::new();
        params.insert("auth_key", self.config.key.clone());
        params.insert("auth_timestamp", timestamp.to_string());
        params.insert("auth_version", AUTH_VERSION.to_string());
        params.insert("body_md5", hex::encode(Md5::digest(body.as_bytes())));

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let path = self.events_path();
        let signature = self.hmac_hex(&format!("POST\n{}\n{}", path, query))?;
        let url = format!(
            "{}{}?{}&auth_signature={}",
            self.config.base_url(),
            path,
            query,
            signature
        );

        Ok(SignedRequest { url, body })
    }
}

/// The JSON each subscriber receives as event data.
fn wire_payload(payload: &EventPayload) -> Value {
    match payload {
        EventPayload::Typing { text } => json!({ "typing": true, "text": text }),
        EventPayload::Final { answer } => json!({ "final": true, "answer": answer }),
        EventPayload::AnswerSent { user_id, answer } => {
            json!({ "userId": user_id, "answer": answer })
        }
    }
}

//=========================================================================================
// `RealtimeRelay` Trait Implementation
//=========================================================================================

#[async_trait]
impl RealtimeRelay for PusherAdapter {
    async fn publish(&self, event: &NotificationEvent) -> PortResult<()> {
        let request = self.sign_publish(event, chrono::Utc::now().timestamp())?;

        let response = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Relay request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Relay rejected '{}' on {}: {} {}", event.name(), event.channel, status, detail);
            return Err(PortError::Unexpected(format!(
                "Relay responded with {}: {}",
                status, detail
            )));
        }

        debug!("Published '{}' on {}", event.name(), event.channel);
        Ok(())
    }

    fn authorize_subscription(&self, socket_id: &str, channel_name: &str) -> PortResult<String> {
        let signature = self.hmac_hex(&format!("{}:{}", socket_id, channel_name))?;
        Ok(format!("{}:{}", self.config.key, signature))
    }
}
