use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use super::PgStore;
use crate::{
    models::{ChatEntity, ChatUser, CreateChatEntity, CreateMessageEntity, MessageEntity, MessageView},
    schema::{chats, messages, users},
    store::{ChatRepository, StoreResult},
};

#[async_trait]
impl ChatRepository for PgStore {
    async fn get_or_create(&self, user_id: i32) -> StoreResult<ChatEntity> {
        let conn = &mut self.conn().await?;

        diesel::insert_into(chats::table)
            .values(CreateChatEntity { user_id })
            .on_conflict(chats::user_id)
            .do_nothing()
            .execute(conn)
            .await?;

        let chat = chats::table
            .filter(chats::user_id.eq(user_id))
            .select(ChatEntity::as_select())
            .first(conn)
            .await
            .context("Failed to get chat")?;

        Ok(chat)
    }

    async fn users_with_chats(&self) -> StoreResult<Vec<ChatUser>> {
        let conn = &mut self.conn().await?;

        let users = users::table
            .inner_join(chats::table)
            .select((users::id, users::name, users::phone, users::email))
            .order(users::name.asc())
            .load(conn)
            .await
            .context("Failed to get chat users")?;

        Ok(users)
    }

    async fn add_message(
        &self,
        chat_id: i32,
        sender_id: i32,
        text: &str,
    ) -> StoreResult<MessageEntity> {
        let conn = &mut self.conn().await?;

        let message = diesel::insert_into(messages::table)
            .values(CreateMessageEntity {
                chat_id,
                sender_id,
                message_text: text.to_string(),
            })
            .returning(MessageEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(message)
    }

    async fn messages(&self, chat_id: i32) -> StoreResult<Vec<MessageView>> {
        let conn = &mut self.conn().await?;

        let messages = messages::table
            .inner_join(users::table)
            .filter(messages::chat_id.eq(chat_id))
            .order((messages::timestamp.asc(), messages::id.asc()))
            .select((
                messages::id,
                messages::chat_id,
                messages::sender_id,
                messages::message_text,
                messages::timestamp,
                users::name,
                users::role,
            ))
            .load(conn)
            .await
            .context("Failed to get messages")?;

        Ok(messages)
    }
}
