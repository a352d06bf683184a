use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use super::PgStore;
use crate::{
    models::{CreateMenuItemEntity, MenuFilter, MenuItemEntity},
    schema::menu_items,
    store::{MenuRepository, StoreResult},
};

#[async_trait]
impl MenuRepository for PgStore {
    async fn create(&self, item: CreateMenuItemEntity) -> StoreResult<MenuItemEntity> {
        let conn = &mut self.conn().await?;

        let item = diesel::insert_into(menu_items::table)
            .values(&item)
            .returning(MenuItemEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(item)
    }

    async fn list(&self, filter: &MenuFilter) -> StoreResult<Vec<MenuItemEntity>> {
        let conn = &mut self.conn().await?;

        let mut query = menu_items::table
            .select(MenuItemEntity::as_select())
            .order((menu_items::created_at.desc(), menu_items::id.desc()))
            .into_boxed();
        if let Some(category) = &filter.category {
            query = query.filter(menu_items::category.eq(category));
        }
        if let Some(item_type) = &filter.item_type {
            query = query.filter(menu_items::item_type.eq(item_type));
        }

        let items = query
            .load(conn)
            .await
            .context("Failed to get menu items")?;

        Ok(items)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<MenuItemEntity>> {
        let conn = &mut self.conn().await?;

        let item = menu_items::table
            .find(id)
            .select(MenuItemEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get menu item")?;

        Ok(item)
    }

    async fn update(
        &self,
        id: i32,
        item: CreateMenuItemEntity,
    ) -> StoreResult<Option<MenuItemEntity>> {
        let conn = &mut self.conn().await?;

        let item = diesel::update(menu_items::table.find(id))
            .set(&item)
            .returning(MenuItemEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        Ok(item)
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let conn = &mut self.conn().await?;

        let deleted = diesel::delete(menu_items::table.find(id))
            .execute(conn)
            .await?;

        Ok(deleted > 0)
    }
}
