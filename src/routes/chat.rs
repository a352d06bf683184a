use axum::{extract::State, http::StatusCode, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath, ApiQuery},
    },
    models::{ChatHistory, ChatUser, MessageEntity},
    services::chats::{self, SaveMessageReq, WebhookQuery},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/chat",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_chat_users))
            .routes(utoipa_axum::routes!(get_messages))
            .routes(utoipa_axum::routes!(save_message))
            .routes(utoipa_axum::routes!(proxy_webhook))
            .routes(utoipa_axum::routes!(get_chat_history)),
    )
}

#[utoipa::path(
    get,
    path = "/users",
    tags = ["Chat"],
    responses(
        (status = 200, description = "Users that have a chat", body = StdResponse<Vec<ChatUser>, String>)
    )
)]
async fn get_chat_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = chats::users_with_chats(&state).await?;
    Ok(StdResponse::ok("Users with chats retrieved successfully", users))
}

#[utoipa::path(
    get,
    path = "/messages/{user_id}",
    tags = ["Chat"],
    params(("user_id" = i32, Path, description = "Chat owner")),
    responses(
        (status = 200, description = "Messages oldest first", body = StdResponse<ChatHistory, String>),
        (status = 404, description = "User not found")
    )
)]
async fn get_messages(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let history = chats::history(&state, user_id).await?;
    Ok(StdResponse::ok("Messages retrieved successfully", history))
}

/// Stores a message. The sender is `senderId`, or the first `bot`/`admin`
/// user when `senderRole` names that role.
#[utoipa::path(
    post,
    path = "/messages",
    tags = ["Chat"],
    request_body = SaveMessageReq,
    responses(
        (status = 201, description = "Message saved", body = StdResponse<MessageEntity, String>),
        (status = 400, description = "Missing fields or no usable sender"),
        (status = 404, description = "User or sender not found")
    )
)]
async fn save_message(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveMessageReq>,
) -> Result<impl IntoResponse, AppError> {
    let message = chats::save_message(&state, body).await?;
    Ok((
        StatusCode::CREATED,
        StdResponse::ok("Message saved successfully", message),
    ))
}

/// Relays `message` (and a numeric `userId`) to the chatbot webhook and
/// wraps its answer in `data`.
#[utoipa::path(
    get,
    path = "/webhook",
    tags = ["Chat"],
    params(WebhookQuery),
    responses(
        (status = 200, description = "Webhook answer"),
        (status = 400, description = "Message is required"),
        (status = 502, description = "Webhook failed or unreachable")
    )
)]
async fn proxy_webhook(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<WebhookQuery>,
) -> Result<impl IntoResponse, AppError> {
    let answer = chats::forward_to_chatbot(&state, query).await?;
    Ok(StdResponse::ok("Webhook response received", answer))
}

#[utoipa::path(
    get,
    path = "/{user_id}",
    tags = ["Chat"],
    params(("user_id" = i32, Path, description = "Chat owner")),
    responses(
        (status = 200, description = "Chat history", body = StdResponse<ChatHistory, String>),
        (status = 404, description = "User not found")
    )
)]
async fn get_chat_history(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let history = chats::history(&state, user_id).await?;
    Ok(StdResponse::ok("Chat history retrieved successfully", history))
}
