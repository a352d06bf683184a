use anyhow::Context;
use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use crate::common::app_error::AppError;

/// Sends `message` (and `userId` when known) to the chatbot webhook as query
/// parameters. JSON answers are passed through; anything else is returned as
/// a string.
pub async fn forward_message(
    client: &Client,
    url: &str,
    message: &str,
    user_id: Option<i32>,
) -> Result<Value, AppError> {
    let mut params = vec![("message", message.to_string())];
    if let Some(user_id) = user_id {
        params.push(("userId", user_id.to_string()));
    }

    let response = client
        .get(url)
        .query(&params)
        .send()
        .await
        .map_err(|err| {
            warn!("Chatbot webhook request failed: {err}");
            AppError::ServiceUnreachable("Chatbot webhook".into())
        })?;

    if !response.status().is_success() {
        warn!("Chatbot webhook answered {}", response.status());
        return Err(AppError::ServiceUnreachable("Chatbot webhook".into()));
    }

    let body = response
        .text()
        .await
        .context("Failed to read chatbot response")?;

    Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
}
