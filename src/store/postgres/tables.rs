use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;

use super::PgStore;
use crate::{
    models::{CreateRestaurantTableEntity, RestaurantTableEntity},
    schema::restaurant_tables,
    store::{StoreResult, TableRepository},
};

#[async_trait]
impl TableRepository for PgStore {
    async fn create(
        &self,
        table: CreateRestaurantTableEntity,
    ) -> StoreResult<RestaurantTableEntity> {
        let conn = &mut self.conn().await?;

        let table = diesel::insert_into(restaurant_tables::table)
            .values(&table)
            .returning(RestaurantTableEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(table)
    }

    async fn list(&self) -> StoreResult<Vec<RestaurantTableEntity>> {
        let conn = &mut self.conn().await?;

        let tables = restaurant_tables::table
            .select(RestaurantTableEntity::as_select())
            .order(restaurant_tables::table_number.asc())
            .load(conn)
            .await
            .context("Failed to get tables")?;

        Ok(tables)
    }

    async fn find(&self, id: i32) -> StoreResult<Option<RestaurantTableEntity>> {
        let conn = &mut self.conn().await?;

        let table = restaurant_tables::table
            .find(id)
            .select(RestaurantTableEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get table")?;

        Ok(table)
    }

    async fn update(
        &self,
        id: i32,
        table: CreateRestaurantTableEntity,
    ) -> StoreResult<Option<RestaurantTableEntity>> {
        let conn = &mut self.conn().await?;

        let table = diesel::update(restaurant_tables::table.find(id))
            .set(&table)
            .returning(RestaurantTableEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?;

        Ok(table)
    }

    async fn set_occupied(
        &self,
        id: i32,
        is_occupied: bool,
    ) -> StoreResult<Option<RestaurantTableEntity>> {
        let conn = &mut self.conn().await?;

        let table = diesel::update(restaurant_tables::table.find(id))
            .set(restaurant_tables::is_occupied.eq(is_occupied))
            .returning(RestaurantTableEntity::as_returning())
            .get_result(conn)
            .await
            .optional()
            .context("Failed to update table occupancy")?;

        Ok(table)
    }
}
