//! End-to-end tests for `/api/questions`, including answer delivery.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{TestApp, ADMIN_EMAIL};
use qa_relay_core::domain::{Channel, EventPayload};
use serde_json::{json, Value};
use uuid::Uuid;

fn ids(listing: &Value) -> Vec<String> {
    listing
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn submitting_requires_a_token() {
    let app = TestApp::new();

    let response = app
        .json(Method::POST, "/api/questions", None, json!({ "question": "why?" }))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let app = TestApp::new();

    let response = app.submit_question("eyJhbGciOiJIUzI1NiJ9.e30.forged", "why?").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submitted_question_is_listed_until_answered() {
    let app = TestApp::new();
    let (user_id, user_token) = app.register("asker@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let submitted = app.submit_question(&user_token, "What is the answer?").await;
    assert_eq!(submitted.status, StatusCode::CREATED);
    assert_eq!(submitted.body, json!({ "success": true }));

    let listing = app.list_questions(&admin_token).await;
    assert_eq!(listing.status, StatusCode::OK);
    let questions = listing.body.as_array().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["content"], "What is the answer?");
    assert_eq!(questions[0]["email"], "asker@example.com");
    assert_eq!(questions[0]["user_id"], user_id.as_str());
    assert!(questions[0]["answer"].is_null());
    let question_id = questions[0]["id"].as_str().unwrap().to_string();

    let answered = app.answer(&admin_token, &question_id, "42").await;
    assert_eq!(answered.status, StatusCode::OK);
    assert_eq!(answered.body, json!({ "success": true, "notified": true }));

    let after = app.list_questions(&admin_token).await;
    assert!(!ids(&after.body).contains(&question_id));
}

#[tokio::test]
async fn answer_is_pushed_once_to_owner_and_once_to_admins() {
    let app = TestApp::new();
    let (user_id, user_token) = app.register("owner@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    app.submit_question(&user_token, "Meaning of life?").await;
    let question_id = ids(&app.list_questions(&admin_token).await.body)[0].clone();
    let owner = Uuid::parse_str(&user_id).unwrap();

    app.answer(&admin_token, &question_id, "42").await;

    let to_user = app.relay.events_on(Channel::User(owner)).await;
    assert_eq!(to_user.len(), 1);
    assert_eq!(
        to_user[0].payload,
        EventPayload::Final {
            answer: "42".to_string()
        }
    );
    let to_admin = app.relay.events_on(Channel::Admin).await;
    assert_eq!(to_admin.len(), 1);
    assert_eq!(
        to_admin[0].payload,
        EventPayload::AnswerSent {
            user_id: owner,
            answer: "42".to_string()
        }
    );
}

#[tokio::test]
async fn listing_is_newest_first_and_stable_without_writes() {
    let app = TestApp::new();
    let (_, user_token) = app.register("asker@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    for text in ["first", "second", "third"] {
        app.submit_question(&user_token, text).await;
    }

    let first = app.list_questions(&admin_token).await;
    let second = app.list_questions(&admin_token).await;

    let contents: Vec<_> = first
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents, vec!["third", "second", "first"]);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn empty_store_lists_an_empty_array() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let listing = app.list_questions(&admin_token).await;

    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.body, json!([]));
}

#[tokio::test]
async fn listing_failure_is_surfaced_not_silenced() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    app.db.set_unavailable(true);

    let listing = app.list_questions(&admin_token).await;

    assert_eq!(listing.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(listing.body["details"].is_string());
}

#[tokio::test]
async fn non_admins_cannot_list_or_answer() {
    let app = TestApp::new();
    let (_, user_token) = app.register("asker@example.com").await;

    assert_eq!(app.list_questions(&user_token).await.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.answer(&user_token, &Uuid::new_v4().to_string(), "42").await.status,
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn second_answer_is_a_conflict_and_not_republished() {
    let app = TestApp::new();
    let (_, user_token) = app.register("asker@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    app.submit_question(&user_token, "Race?").await;
    let question_id = ids(&app.list_questions(&admin_token).await.body)[0].clone();

    app.answer(&admin_token, &question_id, "first").await;
    let second = app.answer(&admin_token, &question_id, "second").await;

    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(app.relay.events().await.len(), 2);
    let stored = app
        .db
        .question(Uuid::parse_str(&question_id).unwrap())
        .await
        .unwrap();
    assert_eq!(stored.answer.as_deref(), Some("first"));
}

#[tokio::test]
async fn answering_validates_the_id() {
    let app = TestApp::new();
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    let missing = app
        .json(Method::PUT, "/api/questions", Some(&admin_token), json!({ "answer": "42" }))
        .await;
    let malformed = app.answer(&admin_token, "not-a-uuid", "42").await;
    let unknown = app.answer(&admin_token, &Uuid::new_v4().to_string(), "42").await;

    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn relay_failure_keeps_the_answer_and_reports_degraded_delivery() {
    let app = TestApp::new();
    let (user_id, user_token) = app.register("asker@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    app.submit_question(&user_token, "Anyone there?").await;
    let question_id = ids(&app.list_questions(&admin_token).await.body)[0].clone();
    let owner = Uuid::parse_str(&user_id).unwrap();
    app.relay.fail_channel(Channel::User(owner));

    let response = app.answer(&admin_token, &question_id, "yes").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "success": true, "notified": false }));
    assert!(app.list_questions(&admin_token).await.body.as_array().unwrap().is_empty());
    // The admin mirror still went out.
    assert_eq!(app.relay.events_on(Channel::Admin).await.len(), 1);
}

#[tokio::test]
async fn forwarded_for_address_is_recorded() {
    let app = TestApp::new();
    let (_, user_token) = app.register("asker@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;

    app.send(
        Request::builder()
            .method(Method::POST)
            .uri("/api/questions")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", user_token))
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::from(json!({ "question": "where am i" }).to_string()))
            .unwrap(),
    )
    .await;

    let listing = app.list_questions(&admin_token).await;
    assert_eq!(listing.body[0]["ip"], "203.0.113.7");
}

#[tokio::test]
async fn blank_question_is_rejected() {
    let app = TestApp::new();
    let (_, user_token) = app.register("asker@example.com").await;

    let response = app.submit_question(&user_token, "   ").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn blank_answer_is_rejected_and_not_published() {
    let app = TestApp::new();
    let (_, user_token) = app.register("asker@example.com").await;
    let (_, admin_token) = app.register(ADMIN_EMAIL).await;
    app.submit_question(&user_token, "Anyone there?").await;
    let question_id = ids(&app.list_questions(&admin_token).await.body)[0].clone();

    let response = app.answer(&admin_token, &question_id, "  \n\t ").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.relay.events().await.is_empty());
    assert_eq!(ids(&app.list_questions(&admin_token).await.body), vec![question_id]);
}

#[tokio::test]
async fn unsupported_method_is_not_allowed() {
    let app = TestApp::new();
    let (_, token) = app.register(ADMIN_EMAIL).await;

    let response = app
        .send(
            Request::builder()
                .method(Method::DELETE)
                .uri("/api/questions")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
}
