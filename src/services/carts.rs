use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    common::{app_error::AppError, app_state::AppState, validation::require_fields},
    domain::{MAX_LINE_QUANTITY, money, sum_lines},
    models::CartView,
    services::users::require_user,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartItemReq {
    pub item_id: Option<i32>,
    pub quantity: Option<i32>,
}

fn check_limit(quantity: i32) -> Result<(), AppError> {
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::validation(format!(
            "Quantity cannot exceed {MAX_LINE_QUANTITY}"
        )));
    }
    Ok(())
}

/// The cart with its lines at current catalog prices.
async fn cart_view(state: &AppState, cart_id: i32) -> Result<CartView, AppError> {
    let items = state.store.carts.lines(cart_id).await?;
    let total = sum_lines(items.iter().map(|line| (&line.price, line.quantity)));

    Ok(CartView {
        cart_id,
        items,
        total: money::format(total),
    })
}

pub async fn get_cart(state: &AppState, user_id: i32) -> Result<CartView, AppError> {
    require_user(state, user_id).await?;
    let cart_id = state.store.carts.get_or_create(user_id).await?;
    cart_view(state, cart_id).await
}

pub async fn add_item(
    state: &AppState,
    user_id: i32,
    req: CartItemReq,
) -> Result<CartView, AppError> {
    require_fields(&[("item_id", &req.item_id), ("quantity", &req.quantity)])?;
    let item_id = req.item_id.unwrap_or_default();
    let quantity = req.quantity.unwrap_or_default();

    if quantity <= 0 {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }
    check_limit(quantity)?;

    require_user(state, user_id).await?;
    let available = state
        .store
        .menu
        .find(item_id)
        .await?
        .is_some_and(|item| item.availability);
    if !available {
        return Err(AppError::not_found("Menu item not found or not available"));
    }

    let cart_id = state.store.carts.get_or_create(user_id).await?;
    state.store.carts.add_item(cart_id, item_id, quantity).await?;
    cart_view(state, cart_id).await
}

/// Sets the quantity of a line. Zero removes it; a missing line is left alone.
pub async fn update_item(
    state: &AppState,
    user_id: i32,
    req: CartItemReq,
) -> Result<CartView, AppError> {
    require_fields(&[("item_id", &req.item_id), ("quantity", &req.quantity)])?;
    let item_id = req.item_id.unwrap_or_default();
    let quantity = req.quantity.unwrap_or_default();

    if quantity < 0 {
        return Err(AppError::validation("Quantity cannot be negative"));
    }
    check_limit(quantity)?;

    require_user(state, user_id).await?;
    let cart_id = state.store.carts.get_or_create(user_id).await?;
    if quantity == 0 {
        state.store.carts.remove_item(cart_id, item_id).await?;
    } else {
        state
            .store
            .carts
            .set_quantity(cart_id, item_id, quantity)
            .await?;
    }
    cart_view(state, cart_id).await
}

pub async fn remove_item(
    state: &AppState,
    user_id: i32,
    item_id: i32,
) -> Result<CartView, AppError> {
    require_user(state, user_id).await?;
    let cart_id = state.store.carts.get_or_create(user_id).await?;
    state.store.carts.remove_item(cart_id, item_id).await?;
    cart_view(state, cart_id).await
}

pub async fn clear_cart(state: &AppState, user_id: i32) -> Result<CartView, AppError> {
    require_user(state, user_id).await?;
    let cart_id = state.store.carts.get_or_create(user_id).await?;
    state.store.carts.clear(cart_id).await?;
    cart_view(state, cart_id).await
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{CreateMenuItemEntity, CreateUserEntity};

    async fn setup() -> (AppState, i32, i32, i32) {
        let state = AppState::in_memory();
        let user = state
            .store
            .users
            .create(CreateUserEntity {
                name: "Meera".into(),
                email: "meera@example.com".into(),
                phone: None,
                role: "customer".into(),
                password: "x".into(),
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (name, price) in [("Masala Dosa", "100"), ("Filter Coffee", "2.35")] {
            let item = state
                .store
                .menu
                .create(CreateMenuItemEntity {
                    name: name.into(),
                    price: price.parse::<Decimal>().unwrap(),
                    description: None,
                    category: None,
                    item_type: "food".into(),
                    availability: true,
                    image_url: None,
                })
                .await
                .unwrap();
            ids.push(item.id);
        }
        (state, user.id, ids[0], ids[1])
    }

    fn line(item_id: i32, quantity: i32) -> CartItemReq {
        CartItemReq {
            item_id: Some(item_id),
            quantity: Some(quantity),
        }
    }

    #[tokio::test]
    async fn adding_twice_merges_the_line() {
        let (state, user_id, dosa, _) = setup().await;
        add_item(&state, user_id, line(dosa, 2)).await.unwrap();
        let cart = add_item(&state, user_id, line(dosa, 3)).await.unwrap();

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.total, "500.00");
    }

    #[tokio::test]
    async fn update_to_zero_removes_the_line() {
        let (state, user_id, dosa, coffee) = setup().await;
        add_item(&state, user_id, line(dosa, 2)).await.unwrap();
        add_item(&state, user_id, line(coffee, 3)).await.unwrap();

        let cart = update_item(&state, user_id, line(dosa, 0)).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].item_id, coffee);
        assert_eq!(cart.total, "7.05");
    }

    #[tokio::test]
    async fn updating_a_missing_line_is_a_no_op() {
        let (state, user_id, dosa, coffee) = setup().await;
        add_item(&state, user_id, line(dosa, 1)).await.unwrap();

        let cart = update_item(&state, user_id, line(coffee, 4)).await.unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].item_id, dosa);
    }

    #[tokio::test]
    async fn quantity_rules() {
        let (state, user_id, dosa, _) = setup().await;

        let err = add_item(&state, user_id, line(dosa, 0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Quantity must be greater than 0");

        let err = update_item(&state, user_id, line(dosa, -1)).await.unwrap_err();
        assert_eq!(err.to_string(), "Quantity cannot be negative");

        let err = add_item(&state, user_id, CartItemReq { item_id: Some(dosa), quantity: None })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: quantity");
    }

    #[tokio::test]
    async fn unavailable_items_cannot_be_added() {
        let (state, user_id, dosa, _) = setup().await;
        let mut item = state.store.menu.find(dosa).await.unwrap().unwrap();
        item.availability = false;
        state
            .store
            .menu
            .update(
                dosa,
                CreateMenuItemEntity {
                    name: item.name,
                    price: item.price,
                    description: None,
                    category: None,
                    item_type: item.item_type,
                    availability: item.availability,
                    image_url: None,
                },
            )
            .await
            .unwrap();

        let err = add_item(&state, user_id, line(dosa, 1)).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let err = add_item(&state, 404, line(dosa, 1)).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn quantities_above_the_line_limit_are_rejected() {
        let (state, user_id, dosa, _) = setup().await;

        let err = add_item(&state, user_id, line(dosa, i32::MAX)).await.unwrap_err();
        assert_eq!(err.to_string(), "Quantity cannot exceed 999");

        let err = update_item(&state, user_id, line(dosa, 1000)).await.unwrap_err();
        assert_eq!(err.to_string(), "Quantity cannot exceed 999");

        assert!(get_cart(&state, user_id).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn merging_past_the_line_limit_keeps_the_line() {
        let (state, user_id, dosa, _) = setup().await;
        add_item(&state, user_id, line(dosa, 999)).await.unwrap();

        let err = add_item(&state, user_id, line(dosa, 1)).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(
            err.to_string(),
            format!("Quantity for menu item {dosa} cannot exceed 999")
        );

        let cart = get_cart(&state, user_id).await.unwrap();
        assert_eq!(cart.items[0].quantity, 999);
    }
}
