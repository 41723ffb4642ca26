//! End-to-end tests for the realtime endpoints under `/api/pusher`.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestApp, ADMIN_EMAIL};
use qa_relay_core::domain::{Channel, EventPayload, NotificationEvent};
use serde_json::json;
use uuid::Uuid;

async fn subscribe(app: &TestApp, token: &str, channel: &str) -> common::TestResponse {
    app.send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/pusher/auth")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(format!(
                "socket_id=1234.5678&channel_name={}",
                channel
            )))
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn text_and_answer_publish_typing_then_final_then_admin_mirror() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    let user_id = Uuid::new_v4();

    let response = app
        .json(
            Method::POST,
            "/api/pusher/answer",
            Some(&admin_token),
            json!({ "userId": user_id, "text": "Thinking", "answer": "Done" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true }));
    assert_eq!(
        app.relay.events().await,
        vec![
            NotificationEvent::typing(user_id, "Thinking"),
            NotificationEvent::final_answer(user_id, "Done"),
            NotificationEvent::answer_sent(user_id, "Done"),
        ]
    );
}

#[tokio::test]
async fn text_alone_only_publishes_typing() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    let user_id = Uuid::new_v4();

    app.json(
        Method::POST,
        "/api/pusher/answer",
        Some(&admin_token),
        json!({ "userId": user_id, "text": "Thin" }),
    )
    .await;

    let events = app.relay.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].channel, Channel::User(user_id));
    assert_eq!(
        events[0].payload,
        EventPayload::Typing {
            text: "Thin".to_string()
        }
    );
}

#[tokio::test]
async fn no_fields_publish_nothing() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let response = app
        .json(
            Method::POST,
            "/api/pusher/answer",
            Some(&admin_token),
            json!({ "userId": Uuid::new_v4() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(app.relay.events().await.is_empty());
}

#[tokio::test]
async fn missing_or_malformed_user_id_is_a_bad_request() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let missing = app
        .json(Method::POST, "/api/pusher/answer", Some(&admin_token), json!({ "answer": "x" }))
        .await;
    let malformed = app
        .json(
            Method::POST,
            "/api/pusher/answer",
            Some(&admin_token),
            json!({ "userId": "undefined", "answer": "x" }),
        )
        .await;

    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert!(app.relay.events().await.is_empty());
}

#[tokio::test]
async fn relay_failure_is_reported_as_internal_error() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    app.relay.fail_channel(Channel::Admin);

    let response = app
        .json(
            Method::POST,
            "/api/pusher/answer",
            Some(&admin_token),
            json!({ "userId": Uuid::new_v4(), "answer": "42" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body["details"]
        .as_str()
        .is_some_and(|d| d.contains("private-admin")));
}

#[tokio::test]
async fn notify_rejects_non_post() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let response = app
        .json(Method::PUT, "/api/pusher/answer", Some(&admin_token), json!({}))
        .await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn users_may_subscribe_only_to_their_own_channel() {
    let app = TestApp::new();
    let (user_id, token) = app.register("asker@example.com").await;

    let own = subscribe(&app, &token, &format!("private-{}", user_id)).await;
    let other = subscribe(&app, &token, &format!("private-{}", Uuid::new_v4())).await;
    let admin = subscribe(&app, &token, "private-admin").await;

    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(
        own.body["auth"],
        format!("recording:1234.5678:private-{}", user_id)
    );
    assert_eq!(other.status, StatusCode::FORBIDDEN);
    assert_eq!(admin.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admins_may_subscribe_to_the_admin_channel() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let response = subscribe(&app, &admin_token, "private-admin").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["auth"].is_string());
}
