use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::chatbot,
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    models::{ChatHistory, ChatUser, MessageEntity},
    services::users::require_user,
};

/// Roles that may be named instead of a sender id.
const ROLE_SENDERS: [&str; 2] = ["bot", "admin"];

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveMessageReq {
    pub user_id: Option<i32>,
    pub message_text: Option<String>,
    pub sender_id: Option<i32>,
    pub sender_role: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WebhookQuery {
    pub message: Option<String>,
    /// Forwarded only when it parses as a number.
    pub user_id: Option<String>,
}

pub async fn users_with_chats(state: &AppState) -> Result<Vec<ChatUser>, AppError> {
    Ok(state.store.chats.users_with_chats().await?)
}

/// The user's conversation, oldest message first. The chat is opened on
/// first access.
pub async fn history(state: &AppState, user_id: i32) -> Result<ChatHistory, AppError> {
    require_user(state, user_id).await?;
    let chat = state.store.chats.get_or_create(user_id).await?;
    let messages = state.store.chats.messages(chat.id).await?;

    Ok(ChatHistory {
        chat_id: chat.id,
        user_id: chat.user_id,
        messages,
    })
}

pub async fn save_message(
    state: &AppState,
    req: SaveMessageReq,
) -> Result<MessageEntity, AppError> {
    require_fields(&[("userId", &req.user_id), ("messageText", &req.message_text)])?;
    let user_id = req.user_id.unwrap_or_default();
    let text = req.message_text.unwrap_or_default();

    require_user(state, user_id).await?;

    let sender_id = match (req.sender_id, req.sender_role.as_deref()) {
        (Some(sender_id), _) => {
            state
                .store
                .users
                .find(sender_id)
                .await?
                .ok_or_else(|| AppError::not_found("Sender not found"))?
                .id
        }
        (None, Some(role)) if ROLE_SENDERS.contains(&role) => {
            state
                .store
                .users
                .find_by_role(role)
                .await?
                .ok_or_else(|| AppError::not_found(format!("No {role} user found")))?
                .id
        }
        _ => return Err(AppError::validation("Invalid senderId or senderRole")),
    };

    let chat = state.store.chats.get_or_create(user_id).await?;
    Ok(state.store.chats.add_message(chat.id, sender_id, &text).await?)
}

/// Relays a message to the chatbot webhook and returns whatever it answered.
pub async fn forward_to_chatbot(state: &AppState, query: WebhookQuery) -> Result<Value, AppError> {
    let message = query
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::validation("Message is required"))?;
    let user_id = query
        .user_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i32>().ok());

    chatbot::forward_message(
        &state.http_client,
        &state.chatbot_webhook_url,
        &message,
        user_id,
    )
    .await
}
