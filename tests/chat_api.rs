mod common;

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use common::{TestApp, error_code};
use restaurant_orderservice::common::app_state::AppState;
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::net::TcpListener;

/// Echo server standing in for the chatbot webhook.
async fn spawn_webhook() -> String {
    async fn echo(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({ "reply": "ok", "received": params }))
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().route("/webhook/on", get(echo)))
            .await
            .unwrap();
    });
    format!("http://{addr}/webhook/on")
}

#[tokio::test]
async fn messages_resolve_the_sender() {
    let app = TestApp::new();
    let user = app.create_user("Asha", "asha@example.com", "customer").await;
    let bot = app.create_user("Helper", "bot@example.com", "bot").await;

    let (status, body) = app
        .post(
            "/api/chat/messages",
            json!({ "userId": user, "messageText": "Table for two?", "senderId": user }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .post(
            "/api/chat/messages",
            json!({ "userId": user, "messageText": "Sure!", "senderRole": "bot" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["sender_id"], bot);

    let (status, body) = app.get(&format!("/api/chat/{user}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], user);
    let messages = body["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["message_text"], "Table for two?");
    assert_eq!(messages[1]["sender_role"], "bot");

    let (_, body) = app.get("/api/chat/users").await;
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Asha");
}

#[tokio::test]
async fn message_without_a_sender_is_rejected() {
    let app = TestApp::new();
    let user = app.create_user("Asha", "asha@example.com", "customer").await;

    let (status, body) = app
        .post(
            "/api/chat/messages",
            json!({ "userId": user, "messageText": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Invalid senderId or senderRole");

    let (status, body) = app
        .post(
            "/api/chat/messages",
            json!({ "userId": user, "messageText": "hi", "senderRole": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn history_of_unknown_user_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/chat/messages/77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_forwards_message_and_numeric_user_id() {
    let url = spawn_webhook().await;
    let app = TestApp::with_state(AppState::in_memory().with_chatbot_webhook_url(url));

    let (status, body) = app
        .get("/api/chat/webhook?message=menu%20please&userId=12")
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["reply"], "ok");
    assert_eq!(body["data"]["received"]["message"], "menu please");
    assert_eq!(body["data"]["received"]["userId"], "12");

    let (_, body) = app.get("/api/chat/webhook?message=hello&userId=abc").await;
    assert!(body["data"]["received"].get("userId").is_none());
}

#[tokio::test]
async fn webhook_failures_are_reported() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/chat/webhook").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Message is required");

    let (status, body) = app.get("/api/chat/webhook?message=hi").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(error_code(&body), "BAD_GATEWAY");
}
