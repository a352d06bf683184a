use anyhow::Context;
use async_trait::async_trait;
use diesel::{
    ExpressionMethods, QueryDsl,
    result::{DatabaseErrorKind, Error as DieselError},
    upsert::excluded,
};
use diesel_async::RunQueryDsl;

use super::PgStore;
use crate::{
    models::{CartLineView, CreateCartEntity, CreateCartItemEntity},
    schema::{cart_items, carts, menu_items},
    store::{CartRepository, StoreError, StoreResult},
};

#[async_trait]
impl CartRepository for PgStore {
    async fn get_or_create(&self, user_id: i32) -> StoreResult<i32> {
        let conn = &mut self.conn().await?;

        diesel::insert_into(carts::table)
            .values(CreateCartEntity { user_id })
            .on_conflict(carts::user_id)
            .do_nothing()
            .execute(conn)
            .await?;

        let cart_id = carts::table
            .filter(carts::user_id.eq(user_id))
            .select(carts::id)
            .first(conn)
            .await
            .context("Failed to get cart")?;

        Ok(cart_id)
    }

    async fn add_item(&self, cart_id: i32, item_id: i32, quantity: i32) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        diesel::insert_into(cart_items::table)
            .values(CreateCartItemEntity {
                cart_id,
                item_id,
                quantity,
            })
            .on_conflict((cart_items::cart_id, cart_items::item_id))
            .do_update()
            .set(cart_items::quantity.eq(cart_items::quantity + excluded(cart_items::quantity)))
            .execute(conn)
            .await
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
                    StoreError::QuantityLimit(item_id)
                }
                other => other.into(),
            })?;

        Ok(())
    }

    async fn set_quantity(&self, cart_id: i32, item_id: i32, quantity: i32) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        diesel::update(
            cart_items::table
                .filter(cart_items::cart_id.eq(cart_id))
                .filter(cart_items::item_id.eq(item_id)),
        )
        .set(cart_items::quantity.eq(quantity))
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn remove_item(&self, cart_id: i32, item_id: i32) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        diesel::delete(
            cart_items::table
                .filter(cart_items::cart_id.eq(cart_id))
                .filter(cart_items::item_id.eq(item_id)),
        )
        .execute(conn)
        .await
        .context("Failed to remove cart item")?;

        Ok(())
    }

    async fn clear(&self, cart_id: i32) -> StoreResult<()> {
        let conn = &mut self.conn().await?;

        diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
            .execute(conn)
            .await
            .context("Failed to clear cart")?;

        Ok(())
    }

    async fn lines(&self, cart_id: i32) -> StoreResult<Vec<CartLineView>> {
        let conn = &mut self.conn().await?;

        let lines = cart_items::table
            .inner_join(menu_items::table)
            .filter(cart_items::cart_id.eq(cart_id))
            .order(cart_items::id.asc())
            .select((
                cart_items::id,
                cart_items::item_id,
                cart_items::quantity,
                menu_items::name,
                menu_items::price,
                menu_items::description,
                menu_items::category,
                menu_items::item_type,
                menu_items::availability,
            ))
            .load(conn)
            .await
            .context("Failed to get cart items")?;

        Ok(lines)
    }
}
