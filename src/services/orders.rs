use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    domain::OrderStatus,
    models::{OrderDetails, OrderEntity, OrderFilter, OrderSummary},
    services::users::require_user,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderReq {
    pub user_id: Option<i32>,
    pub payment_method: Option<String>,
    pub table_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: Option<String>,
}

pub async fn find_order(state: &AppState, id: i32) -> Result<OrderEntity, AppError> {
    state
        .store
        .orders
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

pub async fn get_order(state: &AppState, id: i32) -> Result<OrderDetails, AppError> {
    state
        .store
        .orders
        .details(id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

/// Checks out the user's cart into a new `pending` order.
pub async fn create_order(state: &AppState, req: CreateOrderReq) -> Result<OrderDetails, AppError> {
    require_fields(&[
        ("user_id", &req.user_id),
        ("payment_method", &req.payment_method),
        ("table_id", &req.table_id),
    ])?;
    let user_id = req.user_id.unwrap_or_default();
    let table_id = req.table_id.unwrap_or_default();
    let payment_method = req.payment_method.unwrap_or_default();

    require_user(state, user_id).await?;
    if state.store.tables.find(table_id).await?.is_none() {
        return Err(AppError::not_found("Table not found"));
    }

    let order = state
        .store
        .orders
        .create_from_cart(user_id, table_id, &payment_method)
        .await?;
    info!(
        "Order #{} created from cart of user #{} for {}",
        order.id, user_id, order.total_amount
    );

    get_order(state, order.id).await
}

pub async fn list_orders(
    state: &AppState,
    filter: OrderFilter,
) -> Result<Vec<OrderSummary>, AppError> {
    Ok(state.store.orders.list(&filter).await?)
}

fn parse_status(status: Option<String>) -> Result<OrderStatus, AppError> {
    let status = status
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::validation("status is required"))?;

    status
        .parse::<OrderStatus>()
        .ok()
        .filter(OrderStatus::is_updatable)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Invalid status. Valid statuses: {}",
                OrderStatus::updatable_list()
            ))
        })
}

/// Moves an order to `req.status` if the configured transition table allows
/// it. The write is conditional on the status that was checked.
pub async fn update_status(
    state: &AppState,
    id: i32,
    req: UpdateStatusReq,
) -> Result<OrderDetails, AppError> {
    let to = parse_status(req.status)?;
    let order = find_order(state, id).await?;

    if !state.policies.transitions.allows(order.status, to) {
        return Err(AppError::validation(format!(
            "Cannot change order status from {} to {}",
            order.status, to
        )));
    }

    let updated = state
        .store
        .orders
        .set_status(id, order.status, to)
        .await?;
    if updated.is_none() {
        warn!("Order #{} changed while moving it to {}", id, to);
        return Err(AppError::Conflict(
            "Order status changed concurrently, please retry".into(),
        ));
    }

    info!("Order #{} moved from {} to {}", id, order.status, to);
    get_order(state, id).await
}

/// Cancels a `pending` order. The row and its lines stay as history.
pub async fn cancel_order(state: &AppState, id: i32) -> Result<OrderEntity, AppError> {
    let order = find_order(state, id).await?;
    let not_pending = || AppError::validation("Only pending orders can be cancelled");

    if order.status != OrderStatus::Pending {
        return Err(not_pending());
    }

    let cancelled = state
        .store
        .orders
        .set_status(id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await?
        .ok_or_else(not_pending)?;

    info!("Order #{} has been cancelled", id);
    Ok(cancelled)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        common::config::OrderPolicies,
        domain::TransitionPolicy,
        models::{CreateMenuItemEntity, CreateRestaurantTableEntity, CreateUserEntity},
        services::carts::{self, CartItemReq},
    };

    struct Fixture {
        state: AppState,
        user_id: i32,
        item_id: i32,
        table_id: i32,
    }

    async fn fixture(state: AppState) -> Fixture {
        let user = state
            .store
            .users
            .create(CreateUserEntity {
                name: "Kiran".into(),
                email: "kiran@example.com".into(),
                phone: None,
                role: "customer".into(),
                password: "x".into(),
            })
            .await
            .unwrap();
        let item = state
            .store
            .menu
            .create(CreateMenuItemEntity {
                name: "Biryani".into(),
                price: Decimal::from(100),
                description: None,
                category: Some("mains".into()),
                item_type: "food".into(),
                availability: true,
                image_url: None,
            })
            .await
            .unwrap();
        let table = state
            .store
            .tables
            .create(CreateRestaurantTableEntity {
                table_number: 7,
                seats: 2,
                is_occupied: false,
            })
            .await
            .unwrap();
        Fixture {
            state,
            user_id: user.id,
            item_id: item.id,
            table_id: table.id,
        }
    }

    async fn checkout(f: &Fixture, quantity: i32) -> OrderDetails {
        carts::add_item(
            &f.state,
            f.user_id,
            CartItemReq {
                item_id: Some(f.item_id),
                quantity: Some(quantity),
            },
        )
        .await
        .unwrap();
        create_order(
            &f.state,
            CreateOrderReq {
                user_id: Some(f.user_id),
                payment_method: Some("cash".into()),
                table_id: Some(f.table_id),
            },
        )
        .await
        .unwrap()
    }

    fn status(s: &str) -> UpdateStatusReq {
        UpdateStatusReq {
            status: Some(s.into()),
        }
    }

    #[tokio::test]
    async fn missing_fields_are_listed() {
        let f = fixture(AppState::in_memory()).await;
        let err = create_order(
            &f.state,
            CreateOrderReq {
                user_id: Some(f.user_id),
                payment_method: None,
                table_id: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: payment_method, table_id"
        );
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let f = fixture(AppState::in_memory()).await;
        let err = create_order(
            &f.state,
            CreateOrderReq {
                user_id: Some(f.user_id),
                payment_method: Some("cash".into()),
                table_id: Some(999),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Table not found");
    }

    #[tokio::test]
    async fn lenient_policy_allows_any_updatable_status() {
        let f = fixture(AppState::in_memory()).await;
        let order = checkout(&f, 1).await;

        let order = update_status(&f.state, order.order.id, status("delivered"))
            .await
            .unwrap();
        assert_eq!(order.order.status, OrderStatus::Delivered);

        let order = update_status(&f.state, order.order.id, status("pending"))
            .await
            .unwrap();
        assert_eq!(order.order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn forward_only_policy_rejects_skips() {
        let state = AppState::in_memory().with_policies(OrderPolicies {
            transitions: TransitionPolicy::ForwardOnly,
            ..Default::default()
        });
        let f = fixture(state).await;
        let order = checkout(&f, 1).await;

        let err = update_status(&f.state, order.order.id, status("ready"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change order status from pending to ready");

        update_status(&f.state, order.order.id, status("accepted"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn invalid_status_lists_the_valid_ones() {
        let f = fixture(AppState::in_memory()).await;
        let order = checkout(&f, 1).await;

        for bad in ["shipped", "cancelled"] {
            let err = update_status(&f.state, order.order.id, status(bad))
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid status. Valid statuses: pending, accepted, preparing, ready, delivered, paid"
            );
        }

        let err = update_status(&f.state, 999, status("ready")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn only_pending_orders_can_be_cancelled() {
        let f = fixture(AppState::in_memory()).await;
        let first = checkout(&f, 1).await;
        let cancelled = cancel_order(&f.state, first.order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        let second = checkout(&f, 1).await;
        update_status(&f.state, second.order.id, status("accepted"))
            .await
            .unwrap();
        let err = cancel_order(&f.state, second.order.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Only pending orders can be cancelled");
        let unchanged = find_order(&f.state, second.order.id).await.unwrap();
        assert_eq!(unchanged.status, OrderStatus::Accepted);

        let err = update_status(&f.state, first.order.id, status("pending"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
