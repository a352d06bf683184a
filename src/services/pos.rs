use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    domain::{MAX_LINE_QUANTITY, OrderStatus},
    models::{OrderDetails, OrderEntity, OrderSummary, RequestedLine},
    services::{
        orders::{find_order, get_order},
        users::require_user,
    },
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuickOrderReq {
    pub user_id: Option<i32>,
    pub items: Option<Vec<RequestedLine>>,
    pub payment_method: Option<String>,
}

/// Creates an order straight from a list of items, without a cart or table.
pub async fn create_quick_order(
    state: &AppState,
    req: QuickOrderReq,
) -> Result<OrderDetails, AppError> {
    require_fields(&[
        ("user_id", &req.user_id),
        ("items", &req.items),
        ("payment_method", &req.payment_method),
    ])?;
    let user_id = req.user_id.unwrap_or_default();
    let items = req.items.unwrap_or_default();
    let payment_method = req.payment_method.unwrap_or_default();

    if items.is_empty() {
        return Err(AppError::validation("items must be a non-empty array"));
    }
    if let Some(line) = items
        .iter()
        .find(|line| line.quantity <= 0 || line.quantity > MAX_LINE_QUANTITY)
    {
        return Err(AppError::validation(format!(
            "Invalid quantity for item ID {}",
            line.item_id
        )));
    }

    require_user(state, user_id).await?;

    let order = state
        .store
        .orders
        .create_direct(user_id, &items, &payment_method)
        .await?;
    info!(
        "Quick order #{} created for user #{} with {} lines",
        order.id,
        user_id,
        items.len()
    );

    get_order(state, order.id).await
}

pub async fn active_orders(state: &AppState) -> Result<Vec<OrderSummary>, AppError> {
    Ok(state.store.orders.list_active().await?)
}

/// Marks an order delivered whatever its status, except a cancelled one.
pub async fn close_order(state: &AppState, id: i32) -> Result<OrderEntity, AppError> {
    let order = find_order(state, id).await?;
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::validation("Cancelled orders cannot be closed"));
    }

    let closed = state
        .store
        .orders
        .set_status(id, order.status, OrderStatus::Delivered)
        .await?
        .ok_or_else(|| AppError::Conflict("Order status changed concurrently, please retry".into()))?;

    info!("Order #{} has been closed", id);
    Ok(closed)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        models::{CreateMenuItemEntity, CreateUserEntity, OrderFilter},
        services::orders,
    };

    async fn setup() -> (AppState, i32, i32, i32) {
        let state = AppState::in_memory();
        let user = state
            .store
            .users
            .create(CreateUserEntity {
                name: "Counter".into(),
                email: "pos@example.com".into(),
                phone: None,
                role: "staff".into(),
                password: "x".into(),
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (name, available) in [("Samosa", true), ("Lassi", false)] {
            let item = state
                .store
                .menu
                .create(CreateMenuItemEntity {
                    name: name.into(),
                    price: Decimal::new(4500, 2),
                    description: None,
                    category: None,
                    item_type: "food".into(),
                    availability: available,
                    image_url: None,
                })
                .await
                .unwrap();
            ids.push(item.id);
        }
        (state, user.id, ids[0], ids[1])
    }

    fn quick(user_id: i32, items: Vec<RequestedLine>) -> QuickOrderReq {
        QuickOrderReq {
            user_id: Some(user_id),
            items: Some(items),
            payment_method: Some("cash".into()),
        }
    }

    #[tokio::test]
    async fn quick_order_snapshots_prices() {
        let (state, user_id, samosa, _) = setup().await;
        let order = create_quick_order(
            &state,
            quick(user_id, vec![RequestedLine { item_id: samosa, quantity: 3 }]),
        )
        .await
        .unwrap();

        assert_eq!(order.order.table_id, None);
        assert_eq!(order.order.status, OrderStatus::Pending);
        assert_eq!(order.order.total_amount.to_string(), "135.00");
        assert_eq!(order.items.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_item_fails_the_whole_order() {
        let (state, user_id, samosa, lassi) = setup().await;
        let err = create_quick_order(
            &state,
            quick(
                user_id,
                vec![
                    RequestedLine { item_id: samosa, quantity: 1 },
                    RequestedLine { item_id: lassi, quantity: 3 },
                ],
            ),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(
            orders::list_orders(&state, OrderFilter::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn empty_and_bad_quantities_are_rejected() {
        let (state, user_id, samosa, _) = setup().await;
        let err = create_quick_order(&state, quick(user_id, vec![])).await.unwrap_err();
        assert_eq!(err.to_string(), "items must be a non-empty array");

        let err = create_quick_order(
            &state,
            quick(user_id, vec![RequestedLine { item_id: samosa, quantity: 0 }]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid quantity for item ID {samosa}"));
    }

    #[tokio::test]
    async fn closing_forces_delivered_and_leaves_the_active_list() {
        let (state, user_id, samosa, _) = setup().await;
        let order = create_quick_order(
            &state,
            quick(user_id, vec![RequestedLine { item_id: samosa, quantity: 1 }]),
        )
        .await
        .unwrap();
        assert_eq!(active_orders(&state).await.unwrap().len(), 1);

        let closed = close_order(&state, order.order.id).await.unwrap();
        assert_eq!(closed.status, OrderStatus::Delivered);
        assert!(active_orders(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_orders_stay_cancelled() {
        let (state, user_id, samosa, _) = setup().await;
        let order = create_quick_order(
            &state,
            quick(user_id, vec![RequestedLine { item_id: samosa, quantity: 1 }]),
        )
        .await
        .unwrap();
        orders::cancel_order(&state, order.order.id).await.unwrap();

        let err = close_order(&state, order.order.id).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(active_orders(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn line_quantity_is_capped() {
        let (state, user_id, samosa, _) = setup().await;
        let err = create_quick_order(
            &state,
            quick(user_id, vec![RequestedLine { item_id: samosa, quantity: 1000 }]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), format!("Invalid quantity for item ID {samosa}"));
    }

    #[tokio::test]
    async fn totals_beyond_the_money_column_write_nothing() {
        let (state, user_id, _, _) = setup().await;
        let pricey = state
            .store
            .menu
            .create(CreateMenuItemEntity {
                name: "Whole Restaurant".into(),
                price: "99999999.99".parse().unwrap(),
                description: None,
                category: None,
                item_type: "food".into(),
                availability: true,
                image_url: None,
            })
            .await
            .unwrap();

        let err = create_quick_order(
            &state,
            quick(user_id, vec![RequestedLine { item_id: pricey.id, quantity: 2 }]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.to_string(), "Order total cannot exceed 99999999.99");

        let all = orders::list_orders(&state, OrderFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }
}
