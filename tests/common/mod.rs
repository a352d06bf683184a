#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use restaurant_orderservice::{app, common::app_state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Query string that passes the admin guard.
pub const ADMIN: &str = "userId=1&userRole=admin";

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(AppState::in_memory())
    }

    pub fn with_state(state: AppState) -> Self {
        let router = app(state).expect("router builds");
        Self { router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Creates a user through the admin API and returns its id.
    pub async fn create_user(&self, name: &str, email: &str, role: &str) -> i64 {
        let (status, body) = self
            .post(
                &format!("/api/users?{ADMIN}"),
                json!({
                    "name": name,
                    "email": email,
                    "password": "secret123",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_menu_item(&self, name: &str, price: &str) -> i64 {
        let (status, body) = self
            .post("/api/menu", json!({ "name": name, "price": price }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_table(&self, number: i32) -> i64 {
        let (status, body) = self
            .post("/api/tables", json!({ "table_number": number, "seats": 4 }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn add_to_cart(&self, user_id: i64, item_id: i64, quantity: i32) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/cart/{user_id}/add"),
                json!({ "item_id": item_id, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    /// Checks out the user's cart and returns the order body.
    pub async fn checkout(&self, user_id: i64, table_id: i64) -> Value {
        let (status, body) = self
            .post(
                "/api/orders",
                json!({ "user_id": user_id, "payment_method": "cash", "table_id": table_id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
