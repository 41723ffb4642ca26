//! Shared harness: the full router over in-memory adapters.

#![allow(dead_code)]

use api_lib::{
    adapters::{InMemoryDatabase, JwtTokenAdapter, RecordingRelay},
    config::{Config, RelayConfig},
    web::{router, state::AppState},
};
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tracing::Level;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub router: Router,
    pub db: Arc<InMemoryDatabase>,
    pub relay: Arc<RecordingRelay>,
    pub tokens: Arc<JwtTokenAdapter>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        log_level: Level::DEBUG,
        jwt_secret: "integration-secret".to_string(),
        token_ttl_days: 7,
        relay: RelayConfig {
            app_id: "1".to_string(),
            key: "key".to_string(),
            secret: "secret".to_string(),
            cluster: "eu".to_string(),
            host: None,
        },
        admin_emails: vec![ADMIN_EMAIL.to_string()],
    }
}

impl TestApp {
    pub fn new() -> Self {
        let config = Arc::new(test_config());
        let db = Arc::new(InMemoryDatabase::new());
        let relay = Arc::new(RecordingRelay::new());
        let tokens = Arc::new(JwtTokenAdapter::new(
            &config.jwt_secret,
            Duration::days(config.token_ttl_days),
        ));
        let state = Arc::new(AppState::new(
            config,
            db.clone(),
            tokens.clone(),
            relay.clone(),
        ));

        Self {
            router: router(state),
            db,
            relay,
            tokens,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn auth(&self, action: &str, email: &str, password: &str) -> TestResponse {
        self.json(
            Method::POST,
            "/api/auth",
            None,
            json!({ "action": action, "email": email, "password": password }),
        )
        .await
    }

    /// Registers `email` and returns `(user_id, token)`.
    pub async fn register(&self, email: &str) -> (String, String) {
        let response = self.auth("register", email, PASSWORD).await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        (
            response.body["user"]["id"].as_str().unwrap().to_string(),
            response.body["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn submit_question(&self, token: &str, question: &str) -> TestResponse {
        self.json(
            Method::POST,
            "/api/questions",
            Some(token),
            json!({ "question": question }),
        )
        .await
    }

    pub async fn list_questions(&self, token: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::GET)
                .uri("/api/questions")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn answer(&self, token: &str, question_id: &str, answer: &str) -> TestResponse {
        self.json(
            Method::PUT,
            &format!("/api/questions?id={}", question_id),
            Some(token),
            json!({ "answer": answer }),
        )
        .await
    }
}
