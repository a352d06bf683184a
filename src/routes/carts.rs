use axum::{extract::State, response::IntoResponse};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    common::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{ApiJson, ApiPath},
    },
    models::CartView,
    services::carts::{self, CartItemReq},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/cart",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_cart))
            .routes(utoipa_axum::routes!(add_item))
            .routes(utoipa_axum::routes!(update_item))
            .routes(utoipa_axum::routes!(remove_item))
            .routes(utoipa_axum::routes!(clear_cart)),
    )
}

/// The user's cart with lines at current prices.
#[utoipa::path(
    get,
    path = "/{user_id}",
    tags = ["Cart"],
    params(("user_id" = i32, Path, description = "Owner of the cart")),
    responses(
        (status = 200, description = "Cart retrieved", body = StdResponse<CartView, String>),
        (status = 404, description = "User not found")
    )
)]
async fn get_cart(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let cart = carts::get_cart(&state, user_id).await?;
    Ok(StdResponse::ok("Cart retrieved successfully", cart))
}

/// Adds an item, merging with an existing line.
#[utoipa::path(
    post,
    path = "/{user_id}/add",
    tags = ["Cart"],
    params(("user_id" = i32, Path, description = "Owner of the cart")),
    request_body = CartItemReq,
    responses(
        (status = 200, description = "Item added", body = StdResponse<CartView, String>),
        (status = 400, description = "Missing fields or quantity not positive"),
        (status = 404, description = "User or menu item not found")
    )
)]
async fn add_item(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
    ApiJson(body): ApiJson<CartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let cart = carts::add_item(&state, user_id, body).await?;
    Ok(StdResponse::ok("Item added to cart successfully", cart))
}

/// Sets a line's quantity; zero removes the line.
#[utoipa::path(
    put,
    path = "/{user_id}/update",
    tags = ["Cart"],
    params(("user_id" = i32, Path, description = "Owner of the cart")),
    request_body = CartItemReq,
    responses(
        (status = 200, description = "Cart item updated", body = StdResponse<CartView, String>),
        (status = 400, description = "Missing fields or negative quantity"),
        (status = 404, description = "User not found")
    )
)]
async fn update_item(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
    ApiJson(body): ApiJson<CartItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let cart = carts::update_item(&state, user_id, body).await?;
    Ok(StdResponse::ok("Cart item updated successfully", cart))
}

#[utoipa::path(
    delete,
    path = "/{user_id}/remove/{item_id}",
    tags = ["Cart"],
    params(
        ("user_id" = i32, Path, description = "Owner of the cart"),
        ("item_id" = i32, Path, description = "Menu item to remove")
    ),
    responses(
        (status = 200, description = "Item removed", body = StdResponse<CartView, String>),
        (status = 404, description = "User not found")
    )
)]
async fn remove_item(
    State(state): State<AppState>,
    ApiPath((user_id, item_id)): ApiPath<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let cart = carts::remove_item(&state, user_id, item_id).await?;
    Ok(StdResponse::ok("Item removed from cart successfully", cart))
}

#[utoipa::path(
    delete,
    path = "/{user_id}/clear",
    tags = ["Cart"],
    params(("user_id" = i32, Path, description = "Owner of the cart")),
    responses(
        (status = 200, description = "Cart cleared", body = StdResponse<CartView, String>),
        (status = 404, description = "User not found")
    )
)]
async fn clear_cart(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let cart = carts::clear_cart(&state, user_id).await?;
    Ok(StdResponse::ok("Cart cleared successfully", cart))
}
