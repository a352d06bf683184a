use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use super::PgStore;
use crate::{
    models::{CreateUserEntity, UserEntity},
    schema::users,
    store::{StoreResult, UserRepository},
};

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: CreateUserEntity) -> StoreResult<UserEntity> {
        let conn = &mut self.conn().await?;

        let user = diesel::insert_into(users::table)
            .values(&user)
            .returning(UserEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(user)
    }

    async fn list(&self) -> StoreResult<Vec<UserEntity>> {
        let conn = &mut self.conn().await?;

        let users = users::table
            .select(UserEntity::as_select())
            .order((users::created_at.desc(), users::id.desc()))
            .load(conn)
            .await
            .context("Failed to get users")?;

        Ok(users)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<UserEntity>> {
        let conn = &mut self.conn().await?;

        let user = users::table
            .find(id)
            .select(UserEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get user")?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserEntity>> {
        let conn = &mut self.conn().await?;

        let user = users::table
            .filter(users::email.eq(email))
            .select(UserEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get user by email")?;

        Ok(user)
    }

    async fn find_by_role(&self, role: &str) -> StoreResult<Option<UserEntity>> {
        let conn = &mut self.conn().await?;

        let user = users::table
            .filter(users::role.eq(role))
            .order(users::id.asc())
            .select(UserEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get user by role")?;

        Ok(user)
    }

    async fn email_taken(&self, email: &str, exclude_id: Option<i32>) -> StoreResult<bool> {
        let conn = &mut self.conn().await?;

        let mut query = users::table.filter(users::email.eq(email)).into_boxed();
        if let Some(id) = exclude_id {
            query = query.filter(users::id.ne(id));
        }

        let count: i64 = query
            .count()
            .get_result(conn)
            .await
            .context("Failed to check email")?;

        Ok(count > 0)
    }

    async fn update(&self, id: i32, user: CreateUserEntity) -> StoreResult<Option<UserEntity>> {
        let conn = &mut self.conn().await?;

        let user = diesel::update(users::table.find(id))
            .set(&user)
            .returning(UserEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        Ok(user)
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(users::table.find(id))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }
}
