use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{
    AsyncConnection, AsyncPgConnection, RunQueryDsl, scoped_futures::ScopedFutureExt,
};
use rust_decimal::Decimal;

use super::PgStore;
use crate::{
    domain::{self, OrderStatus},
    models::{
        CreateOrderEntity, CreateOrderItemEntity, OrderDetails, OrderEntity, OrderFilter,
        OrderLineView, OrderSummary, RequestedLine,
    },
    schema::{cart_items, carts, menu_items, order_items, orders, users},
    store::{OrderRepository, StoreError, StoreResult},
};

/// (item id, quantity, unit price)
type PricedLine = (i32, i32, Decimal);

async fn insert_order(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    table_id: Option<i32>,
    payment_method: &str,
    lines: &[PricedLine],
) -> StoreResult<OrderEntity> {
    let total_amount = domain::sum_lines(lines.iter().map(|(_, quantity, price)| (price, *quantity)));
    if !domain::money::in_range(total_amount) {
        return Err(StoreError::TotalOutOfRange);
    }

    let order: OrderEntity = diesel::insert_into(orders::table)
        .values(CreateOrderEntity {
            user_id,
            table_id,
            total_amount,
            payment_method: payment_method.to_string(),
            status: OrderStatus::Pending,
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await?;

    let order_items: Vec<CreateOrderItemEntity> = lines
        .iter()
        .map(|(item_id, quantity, price)| CreateOrderItemEntity {
            order_id: order.id,
            item_id: *item_id,
            quantity: *quantity,
            price: *price,
        })
        .collect();

    diesel::insert_into(order_items::table)
        .values(&order_items)
        .execute(conn)
        .await?;

    Ok(order)
}

#[async_trait]
impl OrderRepository for PgStore {
    async fn create_from_cart(
        &self,
        user_id: i32,
        table_id: i32,
        payment_method: &str,
    ) -> StoreResult<OrderEntity> {
        let conn = &mut self.conn().await?;
        let payment_method = payment_method.to_string();

        conn.transaction::<_, StoreError, _>(move |conn| {
            async move {
                // Row lock so two checkouts of the same cart serialize.
                let cart_id: i32 = carts::table
                    .filter(carts::user_id.eq(user_id))
                    .select(carts::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?
                    .ok_or(StoreError::EmptyCart)?;

                let lines: Vec<PricedLine> = cart_items::table
                    .inner_join(menu_items::table)
                    .filter(cart_items::cart_id.eq(cart_id))
                    .order(cart_items::id.asc())
                    .select((cart_items::item_id, cart_items::quantity, menu_items::price))
                    .load(conn)
                    .await
                    .context("Failed to get cart items")?;

                if lines.is_empty() {
                    return Err(StoreError::EmptyCart);
                }

                let order =
                    insert_order(conn, user_id, Some(table_id), &payment_method, &lines).await?;

                diesel::delete(cart_items::table.filter(cart_items::cart_id.eq(cart_id)))
                    .execute(conn)
                    .await
                    .context("Failed to clear cart")?;

                Ok(order)
            }
            .scope_boxed()
        })
        .await
    }

    async fn create_direct(
        &self,
        user_id: i32,
        lines: &[RequestedLine],
        payment_method: &str,
    ) -> StoreResult<OrderEntity> {
        let conn = &mut self.conn().await?;
        let payment_method = payment_method.to_string();
        let requested = lines.to_vec();

        conn.transaction::<_, StoreError, _>(move |conn| {
            async move {
                let mut priced: Vec<PricedLine> = Vec::with_capacity(requested.len());
                for line in &requested {
                    let item: Option<(Decimal, bool)> = menu_items::table
                        .find(line.item_id)
                        .select((menu_items::price, menu_items::availability))
                        .for_share()
                        .first(conn)
                        .await
                        .optional()
                        .context("Failed to get menu item")?;

                    match item {
                        Some((price, true)) => priced.push((line.item_id, line.quantity, price)),
                        _ => return Err(StoreError::ItemUnavailable(line.item_id)),
                    }
                }

                insert_order(conn, user_id, None, &payment_method, &priced).await
            }
            .scope_boxed()
        })
        .await
    }

    async fn list(&self, filter: &OrderFilter) -> StoreResult<Vec<OrderSummary>> {
        let conn = &mut self.conn().await?;

        let mut query = orders::table
            .inner_join(users::table)
            .select((OrderEntity::as_select(), users::name))
            .order((orders::created_at.desc(), orders::id.desc()))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(orders::status.eq(status));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(orders::user_id.eq(user_id));
        }

        let rows: Vec<(OrderEntity, String)> = query
            .load(conn)
            .await
            .context("Failed to get orders")?;

        Ok(rows
            .into_iter()
            .map(|(order, user_name)| OrderSummary { order, user_name })
            .collect())
    }

    async fn list_active(&self) -> StoreResult<Vec<OrderSummary>> {
        let conn = &mut self.conn().await?;

        let rows: Vec<(OrderEntity, String)> = orders::table
            .inner_join(users::table)
            .filter(orders::status.ne(OrderStatus::Delivered))
            .filter(orders::status.ne(OrderStatus::Cancelled))
            .select((OrderEntity::as_select(), users::name))
            .order((orders::created_at.desc(), orders::id.desc()))
            .load(conn)
            .await
            .context("Failed to get active orders")?;

        Ok(rows
            .into_iter()
            .map(|(order, user_name)| OrderSummary { order, user_name })
            .collect())
    }

    async fn find(&self, id: i32) -> StoreResult<Option<OrderEntity>> {
        let conn = &mut self.conn().await?;

        let order = orders::table
            .find(id)
            .select(OrderEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        Ok(order)
    }

    async fn details(&self, id: i32) -> StoreResult<Option<OrderDetails>> {
        let conn = &mut self.conn().await?;

        let row: Option<(OrderEntity, String, String)> = orders::table
            .inner_join(users::table)
            .filter(orders::id.eq(id))
            .select((OrderEntity::as_select(), users::name, users::email))
            .first(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        let Some((order, user_name, user_email)) = row else {
            return Ok(None);
        };

        let items: Vec<OrderLineView> = order_items::table
            .inner_join(menu_items::table)
            .filter(order_items::order_id.eq(id))
            .order(order_items::id.asc())
            .select((
                order_items::id,
                order_items::item_id,
                order_items::quantity,
                order_items::price,
                menu_items::name,
                menu_items::description,
                menu_items::category,
                menu_items::item_type,
            ))
            .load(conn)
            .await
            .context("Failed to get order items")?;

        Ok(Some(OrderDetails {
            order,
            user_name,
            user_email,
            items,
        }))
    }

    async fn set_status(
        &self,
        id: i32,
        expected: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Option<OrderEntity>> {
        let conn = &mut self.conn().await?;

        let order = diesel::update(
            orders::table
                .filter(orders::id.eq(id))
                .filter(orders::status.eq(expected)),
        )
        .set((
            orders::status.eq(to),
            orders::updated_at.eq(diesel::dsl::now),
        ))
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .optional()
        .context("Failed to update order status")?;

        Ok(order)
    }
}
